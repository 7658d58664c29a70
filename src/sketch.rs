use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ast::{BinOp, Instruction};
use crate::vec2::Vec2;

/// Stable handle to a vector slot in the sketch arena.
///
/// Vector identity is the slot index: slots are mutated in place, never
/// replaced, so a handle captured at evaluation time keeps observing the
/// current component values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VecId(usize);

/// A value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Scalar(f64),
    Vector(VecId),
    /// Opaque string literals (colors, tags) evaluate to themselves.
    Str(String),
}

/// One operand of a recorded source operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Scalar(f64),
    Vector(VecId),
}

/// The provenance record attached to a derived vector: the operation that
/// produced it, with operands kept by handle so recompute reads the
/// operands' current slot contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceOp {
    pub op: BinOp,
    pub left: Operand,
    pub right: Operand,
}

/// A resolved operand at application time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpValue {
    Scalar(f64),
    Vector(Vec2),
}

/// Apply a binary operation under the vector/scalar broadcast rules.
///
/// Returns `None` for `/`, which has no evaluation rule.
pub fn apply_bin_op(op: BinOp, left: OpValue, right: OpValue) -> Option<OpValue> {
    use OpValue::{Scalar, Vector};
    let result = match (op, left, right) {
        (BinOp::Div, _, _) => return None,
        (BinOp::Add, Vector(a), Vector(b)) => Vector(a.add(b)),
        (BinOp::Add, Vector(a), Scalar(s)) | (BinOp::Add, Scalar(s), Vector(a)) => {
            Vector(a.add_scalar(s))
        }
        (BinOp::Add, Scalar(a), Scalar(b)) => Scalar(a + b),
        (BinOp::Sub, Vector(a), Vector(b)) => Vector(a.sub(b)),
        (BinOp::Sub, Vector(a), Scalar(s)) => Vector(a.sub_scalar(s)),
        (BinOp::Sub, Scalar(s), Vector(a)) => Vector(a.rsub_scalar(s)),
        (BinOp::Sub, Scalar(a), Scalar(b)) => Scalar(a - b),
        (BinOp::Mul, Vector(a), Vector(b)) => Vector(a.mul(b)),
        (BinOp::Mul, Vector(a), Scalar(s)) | (BinOp::Mul, Scalar(s), Vector(a)) => {
            Vector(a.scale(s))
        }
        (BinOp::Mul, Scalar(a), Scalar(b)) => Scalar(a * b),
    };
    Some(result)
}

/// The origin a vector is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    /// Another vector, held by reference: the drawn origin tracks future
    /// mutation of the referenced slot.
    Shared(VecId),
    /// A point constructed from numeric arguments.
    Fixed(Vec2),
}

/// Resolved display/interaction properties of a variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedProperties {
    pub color: Option<String>,
    pub interactive: bool,
    pub reference: bool,
    pub origin: Option<Origin>,
}

/// A bound variable: its value, its resolved properties, and the
/// instruction that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    pub value: RuntimeValue,
    pub properties: ResolvedProperties,
    pub source: Instruction,
}

/// The runtime state of one script run.
///
/// Owns the vector arena, the variable environment, the provenance records
/// and the dependency graph. All of it is rebuilt from scratch on every
/// run; within a run, vector slots are only ever mutated in place.
#[derive(Debug, Default)]
pub struct Sketch {
    /// `VecId` → current vector value.
    slots: Vec<Vec2>,
    /// Derived slot → the operation that produced it.
    sources: HashMap<VecId, SourceOp>,
    /// Operand slot → derived slots that used it. Edges are established
    /// exactly once, at evaluation time, and never removed within a run.
    dependents: HashMap<VecId, HashSet<VecId>>,
    /// Name → variable entry. Later assignment overwrites earlier.
    variables: BTreeMap<String, VariableEntry>,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Arena ───────────────────────────────────────────────────────

    /// Allocate a fresh, independent vector slot.
    pub fn alloc(&mut self, v: Vec2) -> VecId {
        let id = VecId(self.slots.len());
        self.slots.push(v);
        id
    }

    /// Allocate a derived vector slot, recording its source operation and
    /// registering a dependency edge from each vector-typed operand.
    pub fn alloc_derived(&mut self, v: Vec2, source: SourceOp) -> VecId {
        let id = self.alloc(v);
        for operand in [source.left, source.right] {
            if let Operand::Vector(op_id) = operand {
                self.dependents.entry(op_id).or_default().insert(id);
            }
        }
        self.sources.insert(id, source);
        id
    }

    /// Current value of a slot.
    pub fn vector(&self, id: VecId) -> Vec2 {
        self.slots[id.index()]
    }

    pub fn vector_mut(&mut self, id: VecId) -> &mut Vec2 {
        &mut self.slots[id.index()]
    }

    /// Resolve an operand against current slot state.
    pub fn op_value(&self, operand: Operand) -> OpValue {
        match operand {
            Operand::Scalar(s) => OpValue::Scalar(s),
            Operand::Vector(id) => OpValue::Vector(self.vector(id)),
        }
    }

    /// The source operation attached to a derived slot, if any.
    pub fn source_of(&self, id: VecId) -> Option<&SourceOp> {
        self.sources.get(&id)
    }

    /// The derived slots registered against an operand slot.
    pub fn dependents_of(&self, id: VecId) -> impl Iterator<Item = VecId> + '_ {
        self.dependents.get(&id).into_iter().flatten().copied()
    }

    // ── Environment ─────────────────────────────────────────────────

    pub fn variables(&self) -> &BTreeMap<String, VariableEntry> {
        &self.variables
    }

    pub fn get(&self, name: &str) -> Option<&VariableEntry> {
        self.variables.get(name)
    }

    /// Bind a variable, overwriting any prior binding of the same name.
    pub fn bind(&mut self, name: String, entry: VariableEntry) {
        self.variables.insert(name, entry);
    }

    /// The current vector value of a named variable, if it holds one.
    pub fn vector_named(&self, name: &str) -> Option<Vec2> {
        match self.variables.get(name)?.value {
            RuntimeValue::Vector(id) => Some(self.vector(id)),
            _ => None,
        }
    }

    /// Resolve a variable's origin to a concrete point.
    pub fn origin_of(&self, entry: &VariableEntry) -> Option<Vec2> {
        match entry.properties.origin? {
            Origin::Shared(id) => Some(self.vector(id)),
            Origin::Fixed(v) => Some(v),
        }
    }

    // ── Incremental recompute ───────────────────────────────────────

    /// Re-apply the stored source operation of a derived slot against the
    /// operands' current values, writing the result back in place.
    ///
    /// Slots without a source operation, and operations whose result is
    /// not a vector, are left untouched.
    pub fn recompute(&mut self, id: VecId) {
        let Some(source) = self.sources.get(&id).copied() else {
            return;
        };
        let left = self.op_value(source.left);
        let right = self.op_value(source.right);
        if let Some(OpValue::Vector(v)) = apply_bin_op(source.op, left, right) {
            *self.vector_mut(id) = v;
        }
    }

    /// Recompute the dependents of a mutated slot.
    ///
    /// Only dependents whose owning variable is flagged `reference` are
    /// refreshed; a drag frame never recomputes the whole transitive
    /// fan-out.
    pub fn recompute_dependents(&mut self, id: VecId) {
        let targets: Vec<VecId> = self
            .dependents_of(id)
            .filter(|&dep| self.is_reference_vector(dep))
            .collect();
        for dep in targets {
            self.recompute(dep);
        }
    }

    /// Whether a slot is the value of a variable flagged `reference`.
    fn is_reference_vector(&self, id: VecId) -> bool {
        self.variables
            .values()
            .any(|entry| entry.value == RuntimeValue::Vector(id) && entry.properties.reference)
    }

    /// External mutation entry point: set a named vector's components in
    /// place (e.g. from a drag) and propagate recompute to its reference
    /// dependents. Returns false if the name is unbound or not a vector.
    pub fn set_vector(&mut self, name: &str, x: f64, y: f64) -> bool {
        let id = match self.variables.get(name).map(|entry| &entry.value) {
            Some(RuntimeValue::Vector(id)) => *id,
            _ => return false,
        };
        self.vector_mut(id).set(x, y);
        self.recompute_dependents(id);
        true
    }
}

impl VecId {
    fn index(self) -> usize {
        self.0
    }
}
