use crate::ast::{BinOp, Expression, InstructionKind};
use crate::sketch::RuntimeValue;
use crate::vec2::Vec2;
use crate::{parse, run_vexl, RunResult};

// ── Helpers ─────────────────────────────────────────────────────────

fn vec_named(result: &RunResult, name: &str) -> Vec2 {
    result
        .sketch
        .vector_named(name)
        .unwrap_or_else(|| panic!("expected \"{}\" to hold a vector", name))
}

fn scalar_named(result: &RunResult, name: &str) -> f64 {
    match result
        .sketch
        .get(name)
        .unwrap_or_else(|| panic!("expected \"{}\" to be bound", name))
        .value
    {
        RuntimeValue::Scalar(n) => n,
        ref other => panic!("expected \"{}\" to hold a scalar, got {:?}", name, other),
    }
}

// ── Script parsing ──────────────────────────────────────────────────

#[test]
fn test_parse_collects_instructions_and_isolates_bad_lines() {
    let script = "\
a = Vec2(1, 2)
a = Vec2(,2)
???
b = 3
";
    let parsed = parse(script);
    assert_eq!(
        parsed.instructions.len(),
        2,
        "two well-formed lines should parse: {:?}",
        parsed.instructions
    );
    assert_eq!(
        parsed.errors.len(),
        1,
        "exactly the line with the empty argument should fail: {:?}",
        parsed.errors
    );
    assert_eq!(parsed.errors[0].line, 2);
    assert!(parsed.errors[0].to_string().starts_with("Line 2: `a = Vec2(,2)` failed."));
}

#[test]
fn test_assignment_line_parses_without_panicking() {
    let parsed = parse("v = Vec2(3, 4)");
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.instructions.len(), 1);
    match &parsed.instructions[0].kind {
        InstructionKind::Assignment { variable, .. } => assert_eq!(variable, "v"),
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn test_operator_symbols_map_to_their_operations() {
    for (src, op) in [
        ("x = 1 + 2", BinOp::Add),
        ("x = 1 - 2", BinOp::Sub),
        ("x = 1 * 2", BinOp::Mul),
        ("x = 1 / 2", BinOp::Div),
    ] {
        let parsed = parse(src);
        assert_eq!(parsed.instructions.len(), 1, "{}", src);
        match &parsed.instructions[0].kind {
            InstructionKind::Assignment {
                expr: Expression::Operation { op: parsed_op, .. },
                ..
            } => assert_eq!(*parsed_op, op, "{}", src),
            other => panic!("expected an operation for {}, got {:?}", src, other),
        }
    }
}

#[test]
fn test_comments_blanks_and_shapeless_lines_are_skipped_silently() {
    let script = "\
// a comment

just some words
";
    let parsed = parse(script);
    assert!(parsed.instructions.is_empty());
    assert!(parsed.errors.is_empty());
}

#[test]
fn test_line_classification_priority() {
    // Method call must win over property syntax for the shared x.y prefix.
    let parsed = parse("v.set(1, 2)\nv.x = 5\nv = 3");
    assert_eq!(parsed.instructions.len(), 3);
    assert!(matches!(
        parsed.instructions[0].kind,
        InstructionKind::MethodCall { .. }
    ));
    assert!(matches!(
        parsed.instructions[1].kind,
        InstructionKind::PropertyModification { .. }
    ));
    assert!(matches!(
        parsed.instructions[2].kind,
        InstructionKind::Assignment { .. }
    ));
}

#[test]
fn test_comma_inside_vec2_never_splits_the_modifier_list() {
    let result = run_vexl("a = Vec2(1,2), interactive");
    assert!(result.parse_errors.is_empty(), "{:?}", result.parse_errors);
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    assert_eq!(vec_named(&result, "a"), Vec2::new(1.0, 2.0));
    assert!(result.sketch.get("a").unwrap().properties.interactive);
}

// ── Assignment & values ─────────────────────────────────────────────

#[test]
fn test_vec2_roundtrip() {
    let result = run_vexl("v = Vec2(3, 4)");
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    let v = vec_named(&result, "v");
    assert_eq!(v.x, 3.0);
    assert_eq!(v.y, 4.0);
}

#[test]
fn test_later_assignment_overwrites_earlier() {
    let result = run_vexl("a = 1\na = 2");
    assert_eq!(result.sketch.variables().len(), 1);
    assert_eq!(scalar_named(&result, "a"), 2.0);
}

#[test]
fn test_opaque_string_literal_value() {
    let result = run_vexl("c = #FF0000");
    assert_eq!(
        result.sketch.get("c").unwrap().value,
        RuntimeValue::Str("#FF0000".to_string())
    );
}

#[test]
fn test_forward_reference_fails() {
    let result = run_vexl("b = a + 1");
    assert_eq!(result.eval_errors.len(), 1, "{:?}", result.eval_errors);
    assert!(
        result.eval_errors[0].message.contains('a'),
        "error should mention the undefined variable: {}",
        result.eval_errors[0]
    );
    assert!(result.sketch.get("b").is_none(), "b must not be bound");
}

#[test]
fn test_failing_instruction_does_not_abort_the_rest() {
    let result = run_vexl("a = Vec2(1, 1)\nb = Foo(2)\nc = a + 1");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "unknown-function");
    assert_eq!(vec_named(&result, "c"), Vec2::new(2.0, 2.0));
}

// ── Broadcast arithmetic ────────────────────────────────────────────

#[test]
fn test_broadcast_rules() {
    let result = run_vexl(
        "\
a = Vec2(5, 8)
b = Vec2(1, 10)
d = a - b
e = 2 * a
f = a + 3
g = 10 - a
h = a * b
s = 2 + 3
",
    );
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    assert_eq!(vec_named(&result, "d"), Vec2::new(4.0, -2.0));
    assert_eq!(vec_named(&result, "e"), Vec2::new(10.0, 16.0));
    assert_eq!(vec_named(&result, "f"), Vec2::new(8.0, 11.0));
    assert_eq!(vec_named(&result, "g"), Vec2::new(5.0, 2.0));
    assert_eq!(vec_named(&result, "h"), Vec2::new(5.0, 80.0));
    assert_eq!(scalar_named(&result, "s"), 5.0);
}

#[test]
fn test_chained_operations_nest_to_the_right() {
    // The first operator splits once; there is no precedence.
    let result = run_vexl("a = Vec2(1, 1)\ng = 2 * a + 1");
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    assert_eq!(vec_named(&result, "g"), Vec2::new(4.0, 4.0));
}

#[test]
fn test_division_is_rejected() {
    let result = run_vexl("a = Vec2(4, 2)\nq = a / 2\nr = 4 / 2");
    assert_eq!(result.eval_errors.len(), 2);
    for err in &result.eval_errors {
        assert_eq!(err.code, "unknown-operator", "{}", err);
    }
    assert!(result.sketch.get("q").is_none());
    assert!(result.sketch.get("r").is_none());
}

// ── Reactive recompute ──────────────────────────────────────────────

#[test]
fn test_reference_vector_recomputes_in_place_on_drag() {
    let mut result = run_vexl("a = Vec2(1, 1), interactive\nd = a * 2, reference");
    assert_eq!(vec_named(&result, "d"), Vec2::new(2.0, 2.0));
    let d_value_before = result.sketch.get("d").unwrap().value.clone();

    assert!(result.sketch.set_vector("a", 3.0, 3.0));

    assert_eq!(vec_named(&result, "d"), Vec2::new(6.0, 6.0));
    // Same slot, same entry: the vector was mutated, not replaced.
    assert_eq!(result.sketch.get("d").unwrap().value, d_value_before);
}

#[test]
fn test_recompute_via_source_operation_directly() {
    let mut result = run_vexl("a = Vec2(1, 1)\nd = a * 2, reference");
    let a_id = match result.sketch.get("a").unwrap().value {
        RuntimeValue::Vector(id) => id,
        ref other => panic!("expected vector, got {:?}", other),
    };
    let d_id = match result.sketch.get("d").unwrap().value {
        RuntimeValue::Vector(id) => id,
        ref other => panic!("expected vector, got {:?}", other),
    };
    assert!(result.sketch.source_of(d_id).is_some());
    assert!(result.sketch.dependents_of(a_id).any(|dep| dep == d_id));

    result.sketch.vector_mut(a_id).set(3.0, 3.0);
    result.sketch.recompute(d_id);
    assert_eq!(result.sketch.vector(d_id), Vec2::new(6.0, 6.0));
}

#[test]
fn test_non_reference_dependents_stay_stale() {
    let mut result = run_vexl("a = Vec2(1, 1)\nc = a + Vec2(0, 0)");
    assert!(result.sketch.set_vector("a", 5.0, 5.0));
    assert_eq!(
        vec_named(&result, "c"),
        Vec2::new(1.0, 1.0),
        "non-reference dependents are left stale"
    );
}

#[test]
fn test_set_vector_rejects_scalars_and_unknown_names() {
    let mut result = run_vexl("s = 5");
    assert!(!result.sketch.set_vector("s", 1.0, 1.0));
    assert!(!result.sketch.set_vector("nope", 1.0, 1.0));
}

// ── Modifiers ───────────────────────────────────────────────────────

#[test]
fn test_modifier_resolution_is_idempotent() {
    let script = "\
o = Vec2(10, 10)
a = Vec2(1, 2), interactive, reference, #00FF00, origin: 3 4
b = Vec2(2, 0), origin(o)
";
    let first = run_vexl(script);
    let second = run_vexl(script);
    for name in ["a", "b"] {
        assert_eq!(
            first.sketch.get(name).unwrap().properties,
            second.sketch.get(name).unwrap().properties,
            "resolving the same modifier list twice must agree for \"{}\"",
            name
        );
    }
    let a_props = &first.sketch.get("a").unwrap().properties;
    assert!(a_props.interactive);
    assert!(a_props.reference);
    assert_eq!(a_props.color.as_deref(), Some("#00FF00"));
}

#[test]
fn test_shared_origin_tracks_mutation_and_fixed_origin_does_not() {
    let mut result = run_vexl(
        "\
o = Vec2(10, 10)
a = Vec2(1, 0), origin(o)
b = Vec2(2, 0), origin: 5 6
",
    );
    let origin_a = result.sketch.origin_of(result.sketch.get("a").unwrap());
    assert_eq!(origin_a, Some(Vec2::new(10.0, 10.0)));

    result.sketch.set_vector("o", 20.0, 20.0);

    let origin_a = result.sketch.origin_of(result.sketch.get("a").unwrap());
    let origin_b = result.sketch.origin_of(result.sketch.get("b").unwrap());
    assert_eq!(origin_a, Some(Vec2::new(20.0, 20.0)), "shared origin tracks");
    assert_eq!(origin_b, Some(Vec2::new(5.0, 6.0)), "fixed origin does not");
}

#[test]
fn test_unknown_property_function_is_fatal_for_the_line() {
    let result = run_vexl("q = Vec2(1, 2), wobble(3)");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "unknown-property-function");
    assert!(result.sketch.get("q").is_none());
}

#[test]
fn test_unknown_flag_warns_but_binds() {
    let result = run_vexl("a = Vec2(1, 2), glowing");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "unknown-modifier");
    assert!(result.eval_errors[0].is_warning());
    assert_eq!(vec_named(&result, "a"), Vec2::new(1.0, 2.0));
}

// ── Methods & properties ────────────────────────────────────────────

#[test]
fn test_method_calls() {
    let result = run_vexl(
        "\
v = Vec2(3, 4)
len = v.length()
v.set(6, 8)
len2 = v.length()
w = v.clone()
w.scale(0.5)
d = v.dot(w)
",
    );
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    assert_eq!(scalar_named(&result, "len"), 5.0);
    assert_eq!(scalar_named(&result, "len2"), 10.0);
    assert_eq!(vec_named(&result, "v"), Vec2::new(6.0, 8.0));
    assert_eq!(vec_named(&result, "w"), Vec2::new(3.0, 4.0));
    // clone is independent of the receiver
    assert_eq!(scalar_named(&result, "d"), 6.0 * 3.0 + 8.0 * 4.0);
}

#[test]
fn test_normalize_in_place() {
    let result = run_vexl("v = Vec2(3, 4)\nv.normalize()");
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    let v = vec_named(&result, "v");
    assert!((v.x - 0.6).abs() < 1e-12);
    assert!((v.y - 0.8).abs() < 1e-12);
}

#[test]
fn test_unknown_method_fails() {
    let result = run_vexl("v = Vec2(1, 2)\nv.frobnicate()");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "unknown-method");
}

#[test]
fn test_property_access_in_expressions() {
    let result = run_vexl("w = Vec2(2, 3)\nh = w.y + 1\nz = w.z");
    assert_eq!(scalar_named(&result, "h"), 4.0);
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "unknown-property");
    assert!(result.sketch.get("z").is_none());
}

#[test]
fn test_property_modification() {
    let result = run_vexl("v = Vec2(3, 4)\nv.x = 9");
    assert!(result.eval_errors.is_empty(), "{:?}", result.eval_errors);
    assert_eq!(vec_named(&result, "v"), Vec2::new(9.0, 4.0));
}

#[test]
fn test_property_modification_requires_a_defined_vector() {
    let result = run_vexl("q.x = 1");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "undefined-variable");

    let result = run_vexl("s = 5\ns.x = 1");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "unknown-property");
}

#[test]
fn test_vec2_argument_validation() {
    let result = run_vexl("a = Vec2(1)");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "bad-arguments");

    let result = run_vexl("a = Vec2(1, b)");
    assert_eq!(result.eval_errors.len(), 1);
    assert_eq!(result.eval_errors[0].code, "undefined-variable");
}

// ── JSON surface ────────────────────────────────────────────────────

#[test]
fn test_environment_json_roundtrips_through_serde() {
    let result = run_vexl("a = Vec2(1, 2), interactive, #CC3344\ns = 2.5");
    let json = crate::json::to_json(&result.sketch);
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["a"]["value"]["x"], 1.0);
    assert_eq!(value["a"]["value"]["y"], 2.0);
    assert_eq!(value["a"]["interactive"], true);
    assert_eq!(value["a"]["color"], "#CC3344");
    assert_eq!(value["s"]["value"], 2.5);

    let pretty = crate::json::to_json_pretty(&result.sketch);
    let reparsed: serde_json::Value = serde_json::from_str(&pretty).expect("valid pretty JSON");
    assert_eq!(value, reparsed);
}

// ── WASM sessions ───────────────────────────────────────────────────

fn c_string_at(ptr: *const u8) -> String {
    let cstr = unsafe { std::ffi::CStr::from_ptr(ptr as *const std::os::raw::c_char) };
    cstr.to_str().expect("valid UTF-8").to_string()
}

#[test]
fn test_session_run_with_unknown_id_is_a_no_op() {
    let src = "a = Vec2(1, 2)";
    let out = unsafe { crate::wasm_session_run(u32::MAX, src.as_ptr(), src.len()) };
    assert_eq!(c_string_at(out), "[]");
}

#[test]
fn test_session_run_and_read_back() {
    let id = crate::wasm_session_new();
    let src = "a = Vec2(1, 2)";
    let errors = unsafe { crate::wasm_session_run(id, src.as_ptr(), src.len()) };
    assert_eq!(c_string_at(errors), "[]");

    let json = c_string_at(crate::wasm_session_get_value(id));
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["a"]["value"]["x"], 1.0);

    crate::wasm_session_free(id);
}

#[test]
fn test_errors_json() {
    let result = run_vexl("b = a + 1");
    let errors: Vec<_> = result.all_errors().cloned().collect();
    let json = crate::json::errors_to_json(&errors);
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    let arr = value.as_array().expect("array of errors");
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["code"], "undefined-variable");
    assert_eq!(arr[0]["line"], 1);
    assert_eq!(arr[0]["source"], "b = a + 1");
}
