use crate::ast::*;
use crate::error::VexlError;
use regex::Regex;

/// Result of parsing a whole script: the instructions that parsed plus one
/// error entry per line that failed while parsing a recognized shape.
#[derive(Debug)]
pub struct ParseResult {
    pub instructions: Vec<Instruction>,
    pub errors: Vec<VexlError>,
}

/// Parse a script into instructions, isolating failures line by line.
///
/// Lines are trimmed; blanks and `//` comments are discarded. Each
/// remaining line is classified in fixed priority order: method call,
/// property modification, assignment. A line matching none of the three
/// shapes yields nothing at all — no instruction, no error. This function
/// never panics; all failures end up in the returned error list.
pub fn parse(input: &str) -> ParseResult {
    let parser = Parser::new();
    let mut instructions = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        match parser.parse_line(line) {
            Ok(Some(kind)) => instructions.push(Instruction {
                kind,
                line: line_no,
                source: line.to_string(),
            }),
            Ok(None) => {} // shapeless line: silently skipped
            Err(err) => errors.push(err.at_line(line_no, line)),
        }
    }

    ParseResult {
        instructions,
        errors,
    }
}

/// The compiled pattern set. The language is defined by pattern shapes
/// rather than a grammar, so each shape is one anchored regex, compiled
/// once per parse.
struct Parser {
    method_line: Regex,
    property_line: Regex,
    assign_line: Regex,
    function_call: Regex,
    operation: Regex,
    member_access: Regex,
    identifier: Regex,
    colon_modifier: Regex,
}

impl Parser {
    fn new() -> Self {
        // Hard-coded patterns; Regex::new cannot fail on them.
        Parser {
            method_line: Regex::new(r"^([A-Za-z_]\w*)\.([A-Za-z_]\w*)\s*\((.*)\)$").unwrap(),
            property_line: Regex::new(r"^([A-Za-z_]\w*)\.([A-Za-z_]\w*)\s*=\s*(.+)$").unwrap(),
            assign_line: Regex::new(r"^([A-Za-z_]\w*)\s*=\s*(.+)$").unwrap(),
            function_call: Regex::new(r"^([A-Za-z_]\w*)\s*\((.*)\)$").unwrap(),
            // Permissive by design: the first operator with a non-empty
            // left substring splits the string once. No precedence.
            operation: Regex::new(r"^(.+?)\s*([+\-*/])\s*(.+)$").unwrap(),
            member_access: Regex::new(r"^([A-Za-z_]\w*)\.([A-Za-z_]\w*)$").unwrap(),
            identifier: Regex::new(r"^[A-Za-z_]\w*$").unwrap(),
            colon_modifier: Regex::new(r"^([A-Za-z_]\w*)\s*:\s*(.+)$").unwrap(),
        }
    }

    // ── Line classification ─────────────────────────────────────────

    /// Classify one trimmed line into an instruction, trying the three
    /// shapes in priority order. Method-call syntax must be checked before
    /// property syntax because both share the `x.y` prefix shape.
    fn parse_line(&self, line: &str) -> Result<Option<InstructionKind>, VexlError> {
        if let Some(caps) = self.method_line.captures(line) {
            if args_balanced(&caps[3]) {
                return Ok(Some(InstructionKind::MethodCall {
                    variable: caps[1].to_string(),
                    method: caps[2].to_string(),
                    args: self.parse_args(&caps[3])?,
                }));
            }
        }

        if let Some(caps) = self.property_line.captures(line) {
            return Ok(Some(InstructionKind::PropertyModification {
                variable: caps[1].to_string(),
                property: caps[2].to_string(),
                expr: self.parse_expression(&caps[3])?,
            }));
        }

        if let Some(caps) = self.assign_line.captures(line) {
            let rhs = &caps[2];
            let (main, modifiers) = split_main_and_modifiers(rhs);
            return Ok(Some(InstructionKind::Assignment {
                variable: caps[1].to_string(),
                expr: self.parse_expression(main)?,
                modifiers: match modifiers {
                    Some(text) => self.parse_modifiers(text)?,
                    None => Vec::new(),
                },
            }));
        }

        Ok(None)
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// Recursively parse a right-hand-side fragment. First match wins:
    /// function call, binary operation, member call, member access, value.
    fn parse_expression(&self, text: &str) -> Result<Expression, VexlError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VexlError::new("syntax-error", "empty expression"));
        }

        if let Some(caps) = self.function_call.captures(text) {
            if args_balanced(&caps[2]) {
                return Ok(Expression::FunctionCall {
                    name: caps[1].to_string(),
                    args: self.parse_args(&caps[2])?,
                });
            }
        }

        if let Some(caps) = self.operation.captures(text) {
            if let Some(op) = caps[2].chars().next().and_then(BinOp::from_symbol) {
                return Ok(Expression::Operation {
                    op,
                    left: Box::new(self.parse_expression(&caps[1])?),
                    right: Box::new(self.parse_expression(&caps[3])?),
                });
            }
        }

        if let Some(caps) = self.method_line.captures(text) {
            if args_balanced(&caps[3]) {
                return Ok(Expression::MethodCall {
                    variable: caps[1].to_string(),
                    method: caps[2].to_string(),
                    args: self.parse_args(&caps[3])?,
                });
            }
        }

        if let Some(caps) = self.member_access.captures(text) {
            return Ok(Expression::PropertyAccess {
                variable: caps[1].to_string(),
                property: caps[2].to_string(),
            });
        }

        Ok(self.parse_value(text))
    }

    /// Parse a bare token. Identifier-shaped tokens are variable
    /// references, finite numbers are numeric literals, everything else is
    /// an opaque string (colors and unrecognized tags).
    fn parse_value(&self, token: &str) -> Expression {
        let token = token.trim();
        if self.identifier.is_match(token) {
            return Expression::Variable(token.to_string());
        }
        if let Ok(n) = token.parse::<f64>() {
            if n.is_finite() {
                return Expression::Number(n);
            }
        }
        Expression::Str(token.to_string())
    }

    /// Parse a comma-separated argument list (split at top level only).
    fn parse_args(&self, text: &str) -> Result<Vec<Expression>, VexlError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        split_top_level(text)
            .into_iter()
            .map(|piece| self.parse_expression(piece))
            .collect()
    }

    // ── Modifiers ───────────────────────────────────────────────────

    /// Parse the trailing option list of an assignment.
    fn parse_modifiers(&self, text: &str) -> Result<Vec<Modifier>, VexlError> {
        let mut modifiers = Vec::new();
        for piece in split_top_level(text) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }

            // `key: v1 v2 …`
            if let Some(caps) = self.colon_modifier.captures(piece) {
                let args = caps[2]
                    .split_whitespace()
                    .map(|tok| self.parse_value(tok))
                    .collect();
                modifiers.push(Modifier::PropertyFunction {
                    name: caps[1].to_string(),
                    args,
                });
                continue;
            }

            // `key(v1, v2)` — reuse expression parsing, relabel the call.
            match self.parse_expression(piece)? {
                Expression::FunctionCall { name, args } => {
                    modifiers.push(Modifier::PropertyFunction { name, args });
                }
                // Bare words and color literals.
                _ => modifiers.push(Modifier::Flag(piece.to_string())),
            }
        }
        Ok(modifiers)
    }
}

// ── Top-level splitting ─────────────────────────────────────────────

/// Split an assignment right-hand side into the main expression and the
/// modifier list, cutting at the first comma at parenthesis depth zero.
/// This keeps commas inside `Vec2(a, b)` out of the modifier list.
fn split_main_and_modifiers(rhs: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (i, ch) in rhs.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return (&rhs[..i], Some(&rhs[i + 1..])),
            _ => {}
        }
    }
    (rhs, None)
}

/// Split on commas at parenthesis depth zero.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Check that a captured argument string never closes the enclosing call
/// early. The anchored call patterns are greedy, so for input like
/// `Vec2(1,2) + Vec2(3,4)` they capture `1,2) + Vec2(3,4` — the depth scan
/// rejects that and lets the operation pattern have the string instead.
fn args_balanced(args: &str) -> bool {
    let mut depth = 0i32;
    for ch in args.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
