use crate::ast::*;
use crate::error::VexlError;
use crate::sketch::{
    apply_bin_op, OpValue, Operand, Origin, ResolvedProperties, RuntimeValue, Sketch, SourceOp,
    VariableEntry,
};
use crate::vec2::Vec2;

/// The vector method names the runtime knows how to dispatch. Anything
/// else fails with `unknown-method` — no reflection.
const VECTOR_METHODS: [&str; 6] = ["set", "scale", "normalize", "length", "dot", "clone"];

/// Execute parsed instructions strictly in source order, mutating the
/// sketch in place and returning any non-fatal errors.
///
/// A failing instruction is recorded and never aborts the rest of the
/// script; the sketch keeps whatever the earlier instructions built.
pub fn execute(instructions: &[Instruction], sketch: &mut Sketch) -> Vec<VexlError> {
    let mut errors = Vec::new();
    for instruction in instructions {
        let mut warnings = Vec::new();
        let outcome = execute_instruction(instruction, sketch, &mut warnings);
        errors.extend(
            warnings
                .into_iter()
                .map(|w| w.at_line(instruction.line, &instruction.source)),
        );
        if let Err(err) = outcome {
            errors.push(err.at_line(instruction.line, &instruction.source));
        }
    }
    errors
}

fn execute_instruction(
    instruction: &Instruction,
    sketch: &mut Sketch,
    warnings: &mut Vec<VexlError>,
) -> Result<(), VexlError> {
    match &instruction.kind {
        InstructionKind::Assignment {
            variable,
            expr,
            modifiers,
        } => {
            let value = evaluate(expr, sketch)?;
            let properties = resolve_properties(modifiers, sketch, warnings)?;
            sketch.bind(
                variable.clone(),
                VariableEntry {
                    value,
                    properties,
                    source: instruction.clone(),
                },
            );
            Ok(())
        }
        InstructionKind::PropertyModification {
            variable,
            property,
            expr,
        } => execute_property_modification(variable, property, expr, sketch),
        InstructionKind::MethodCall {
            variable,
            method,
            args,
        } => {
            // Invoked for its side effect; the return value is dropped.
            call_method(variable, method, args, sketch)?;
            Ok(())
        }
    }
}

/// `name.property = expr` — write a field of an existing vector.
fn execute_property_modification(
    variable: &str,
    property: &str,
    expr: &Expression,
    sketch: &mut Sketch,
) -> Result<(), VexlError> {
    let entry = sketch
        .get(variable)
        .ok_or_else(|| undefined_variable(variable))?;
    let id = match &entry.value {
        RuntimeValue::Vector(id) => *id,
        _ => return Err(unknown_property(variable, property)),
    };

    let n = match evaluate(expr, sketch)? {
        RuntimeValue::Scalar(n) => n,
        _ => {
            return Err(VexlError::new(
                "bad-arguments",
                format!("property \"{property}\" expects a number"),
            ))
        }
    };

    match property {
        "x" => sketch.vector_mut(id).x = n,
        "y" => sketch.vector_mut(id).y = n,
        _ => return Err(unknown_property(variable, property)),
    }
    Ok(())
}

// ── Expression evaluation ───────────────────────────────────────────

/// Evaluate an expression tree to a runtime value.
pub fn evaluate(expr: &Expression, sketch: &mut Sketch) -> Result<RuntimeValue, VexlError> {
    match expr {
        Expression::Number(n) => Ok(RuntimeValue::Scalar(*n)),
        Expression::Str(s) => Ok(RuntimeValue::Str(s.clone())),
        Expression::Variable(name) => match sketch.get(name) {
            Some(entry) => Ok(entry.value.clone()),
            None => Err(undefined_variable(name)),
        },
        Expression::FunctionCall { name, args } => evaluate_function_call(name, args, sketch),
        Expression::Operation { op, left, right } => evaluate_operation(*op, left, right, sketch),
        Expression::MethodCall {
            variable,
            method,
            args,
        } => call_method(variable, method, args, sketch),
        Expression::PropertyAccess { variable, property } => {
            let entry = sketch
                .get(variable)
                .ok_or_else(|| undefined_variable(variable))?;
            match &entry.value {
                RuntimeValue::Vector(id) => {
                    let v = sketch.vector(*id);
                    match property.as_str() {
                        "x" => Ok(RuntimeValue::Scalar(v.x)),
                        "y" => Ok(RuntimeValue::Scalar(v.y)),
                        _ => Err(unknown_property(variable, property)),
                    }
                }
                _ => Err(unknown_property(variable, property)),
            }
        }
    }
}

/// `Vec2(x, y)` is the only recognized constructor.
fn evaluate_function_call(
    name: &str,
    args: &[Expression],
    sketch: &mut Sketch,
) -> Result<RuntimeValue, VexlError> {
    if name != "Vec2" {
        return Err(VexlError::new(
            "unknown-function",
            format!("unrecognised function call \"{name}\""),
        ));
    }
    let values = evaluate_args(args, sketch)?;
    match values.as_slice() {
        [RuntimeValue::Scalar(x), RuntimeValue::Scalar(y)] => {
            let id = sketch.alloc(Vec2::new(*x, *y));
            Ok(RuntimeValue::Vector(id))
        }
        _ => Err(VexlError::new(
            "bad-arguments",
            "Vec2 expects two numeric arguments",
        )),
    }
}

/// Evaluate both sides of an operation, apply the broadcast rules, and —
/// when the result is a vector — attach its source-operation record and
/// dependency edges so it can be recomputed in place later.
fn evaluate_operation(
    op: BinOp,
    left: &Expression,
    right: &Expression,
    sketch: &mut Sketch,
) -> Result<RuntimeValue, VexlError> {
    let left = as_operand(evaluate(left, sketch)?, op)?;
    let right = as_operand(evaluate(right, sketch)?, op)?;

    let applied = apply_bin_op(op, sketch.op_value(left), sketch.op_value(right)).ok_or_else(
        || {
            VexlError::new(
                "unknown-operator",
                format!("unrecognised operator '{}'", op.symbol()),
            )
        },
    )?;

    match applied {
        OpValue::Scalar(s) => Ok(RuntimeValue::Scalar(s)),
        OpValue::Vector(v) => {
            let id = sketch.alloc_derived(v, SourceOp { op, left, right });
            Ok(RuntimeValue::Vector(id))
        }
    }
}

fn as_operand(value: RuntimeValue, op: BinOp) -> Result<Operand, VexlError> {
    match value {
        RuntimeValue::Scalar(s) => Ok(Operand::Scalar(s)),
        RuntimeValue::Vector(id) => Ok(Operand::Vector(id)),
        RuntimeValue::Str(s) => Err(VexlError::new(
            "bad-arguments",
            format!("cannot apply '{}' to string \"{s}\"", op.symbol()),
        )),
    }
}

fn evaluate_args(
    args: &[Expression],
    sketch: &mut Sketch,
) -> Result<Vec<RuntimeValue>, VexlError> {
    args.iter().map(|arg| evaluate(arg, sketch)).collect()
}

// ── Method dispatch ─────────────────────────────────────────────────

/// Dispatch a named method against a variable's vector value.
///
/// The target variable and the method name are validated before the
/// arguments are evaluated. In-place methods return the receiver.
fn call_method(
    variable: &str,
    method: &str,
    args: &[Expression],
    sketch: &mut Sketch,
) -> Result<RuntimeValue, VexlError> {
    let entry = sketch
        .get(variable)
        .ok_or_else(|| undefined_variable(variable))?;
    let id = match &entry.value {
        RuntimeValue::Vector(id) => *id,
        _ => return Err(unknown_method(method)),
    };
    if !VECTOR_METHODS.contains(&method) {
        return Err(unknown_method(method));
    }

    let values = evaluate_args(args, sketch)?;
    match (method, values.as_slice()) {
        ("set", [RuntimeValue::Scalar(x), RuntimeValue::Scalar(y)]) => {
            sketch.vector_mut(id).set(*x, *y);
            Ok(RuntimeValue::Vector(id))
        }
        ("scale", [RuntimeValue::Scalar(k)]) => {
            let scaled = sketch.vector(id).scale(*k);
            *sketch.vector_mut(id) = scaled;
            Ok(RuntimeValue::Vector(id))
        }
        ("normalize", []) => {
            let unit = sketch.vector(id).normalized();
            *sketch.vector_mut(id) = unit;
            Ok(RuntimeValue::Vector(id))
        }
        ("length", []) => Ok(RuntimeValue::Scalar(sketch.vector(id).length())),
        ("dot", [RuntimeValue::Vector(other)]) => {
            Ok(RuntimeValue::Scalar(sketch.vector(id).dot(sketch.vector(*other))))
        }
        ("clone", []) => {
            let copy = sketch.vector(id);
            Ok(RuntimeValue::Vector(sketch.alloc(copy)))
        }
        _ => Err(VexlError::new(
            "bad-arguments",
            format!("wrong arguments for method \"{method}\""),
        )),
    }
}

// ── Modifier resolution ─────────────────────────────────────────────

/// Fold a modifier list into resolved properties.
///
/// Unknown property-function names are fatal for the instruction; unknown
/// bare flags are skipped with a warning entry.
fn resolve_properties(
    modifiers: &[Modifier],
    sketch: &mut Sketch,
    warnings: &mut Vec<VexlError>,
) -> Result<ResolvedProperties, VexlError> {
    let mut properties = ResolvedProperties::default();
    for modifier in modifiers {
        match modifier {
            Modifier::PropertyFunction { name, args } if name == "origin" => {
                properties.origin = Some(resolve_origin(args, sketch)?);
            }
            Modifier::PropertyFunction { name, .. } => {
                return Err(VexlError::new(
                    "unknown-property-function",
                    format!("unrecognised property function \"{name}\""),
                ));
            }
            Modifier::Flag(token) if token.starts_with('#') => {
                properties.color = Some(token.clone());
            }
            Modifier::Flag(token) if token == "interactive" => properties.interactive = true,
            Modifier::Flag(token) if token == "reference" => properties.reference = true,
            Modifier::Flag(token) => warnings.push(VexlError::new(
                "unknown-modifier",
                format!("ignoring unknown modifier \"{token}\""),
            )),
        }
    }
    Ok(properties)
}

/// A single vector-valued argument is used as the origin by reference, so
/// the drawn origin tracks future mutation of that vector. Anything else
/// must be two numbers, giving a fixed point.
fn resolve_origin(args: &[Expression], sketch: &mut Sketch) -> Result<Origin, VexlError> {
    let values = evaluate_args(args, sketch)?;
    if let [RuntimeValue::Vector(id)] = values.as_slice() {
        return Ok(Origin::Shared(*id));
    }
    match values.as_slice() {
        [RuntimeValue::Scalar(x), RuntimeValue::Scalar(y)] => {
            Ok(Origin::Fixed(Vec2::new(*x, *y)))
        }
        _ => Err(VexlError::new(
            "bad-arguments",
            "origin expects a vector or two numbers",
        )),
    }
}

// ── Error helpers ───────────────────────────────────────────────────

fn undefined_variable(name: &str) -> VexlError {
    VexlError::new(
        "undefined-variable",
        format!("variable \"{name}\" not defined"),
    )
}

fn unknown_property(variable: &str, property: &str) -> VexlError {
    VexlError::new(
        "unknown-property",
        format!("property \"{property}\" not found on \"{variable}\""),
    )
}

fn unknown_method(method: &str) -> VexlError {
    VexlError::new("unknown-method", format!("method \"{method}\" not found"))
}
