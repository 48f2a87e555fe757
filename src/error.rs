use thiserror::Error;

use crate::datatypes::ElementType;

#[derive(Debug, Error)]
pub enum FemError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Mesher error: invalid mesh parameters: {0}")]
    InvalidMeshParameters(String),

    #[error("Assembler error: element {element} is degenerate (signed area {area})")]
    DegenerateElement { element: usize, area: f64 },

    #[error("Assembler error: element {element} references node {node}, but there are only {num_nodes} nodes")]
    IndexOutOfRange {
        element: usize,
        node: usize,
        num_nodes: usize,
    },

    #[error("Assembler error: assembly of {0} elements is not implemented")]
    UnsupportedElementType(ElementType),

    #[error("Input error: expected {expected} values for {name}, found {found}")]
    CoefficientLength {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Solver error: {0}")]
    Solver(String),
}
