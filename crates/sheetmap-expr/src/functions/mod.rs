//! Built-in functions
//!
//! The registry is a fixed table; names are matched case-insensitively.

pub mod logical;
pub mod math;

use crate::evaluator::Value;

/// Function implementation signature
pub type FunctionImpl = fn(&[Value]) -> Value;

/// Function definition
#[derive(Debug)]
pub struct FunctionDef {
    /// Function name (lowercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// A null argument makes the whole call null without invoking the implementation
    pub propagates_null: bool,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Check an argument count against this definition
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable arity, for error messages
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => format!("{}", max),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

static FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "min",
        min_args: 1,
        max_args: None,
        propagates_null: true,
        implementation: math::fn_min,
    },
    FunctionDef {
        name: "max",
        min_args: 1,
        max_args: None,
        propagates_null: true,
        implementation: math::fn_max,
    },
    FunctionDef {
        name: "abs",
        min_args: 1,
        max_args: Some(1),
        propagates_null: true,
        implementation: math::fn_abs,
    },
    FunctionDef {
        name: "round",
        min_args: 1,
        max_args: Some(2),
        propagates_null: true,
        implementation: math::fn_round,
    },
    FunctionDef {
        name: "floor",
        min_args: 1,
        max_args: Some(1),
        propagates_null: true,
        implementation: math::fn_floor,
    },
    FunctionDef {
        name: "ceil",
        min_args: 1,
        max_args: Some(1),
        propagates_null: true,
        implementation: math::fn_ceil,
    },
    FunctionDef {
        name: "sqrt",
        min_args: 1,
        max_args: Some(1),
        propagates_null: true,
        implementation: math::fn_sqrt,
    },
    FunctionDef {
        name: "pow",
        min_args: 1,
        max_args: Some(2),
        propagates_null: true,
        implementation: math::fn_pow,
    },
    FunctionDef {
        name: "if",
        min_args: 2,
        max_args: Some(3),
        propagates_null: false,
        implementation: logical::fn_if,
    },
    FunctionDef {
        name: "coalesce",
        min_args: 1,
        max_args: None,
        propagates_null: false,
        implementation: logical::fn_coalesce,
    },
];

/// Look up a function by name, ignoring case
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|def| def.name.eq_ignore_ascii_case(name))
}

/// True when `name` is a registered function
pub fn is_function_name(name: &str) -> bool {
    lookup(name).is_some()
}

/// Names of all registered functions
pub fn names() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().map(|def| def.name)
}
