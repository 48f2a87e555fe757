use std::{fmt::Display, str::FromStr};

use nalgebra::{DMatrix, DVector};

use crate::error::FemError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// Shape of the elements produced by the mesher
///
/// The conventional names `2DQU4N` (2D, quadrilateral, 4 nodes) and `2DTR3N`
/// (2D, triangular, 3 nodes) are accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    Quad4,
    #[default]
    Tri3,
}

impl ElementType {
    pub fn nodes_per_element(&self) -> usize {
        match self {
            ElementType::Quad4 => 4,
            ElementType::Tri3 => 3,
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::Quad4 => write!(f, "2DQU4N"),
            ElementType::Tri3 => write!(f, "2DTR3N"),
        }
    }
}

impl FromStr for ElementType {
    type Err = FemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2dqu4n" | "quad4" | "quad" => Ok(ElementType::Quad4),
            "2dtr3n" | "tri3" | "tri" => Ok(ElementType::Tri3),
            other => Err(FemError::Input(format!("Unrecognized element type '{other}'"))),
        }
    }
}

/// Node connectivity of one element. Nodes are listed counter-clockwise and
/// index into the mesh's node list (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Tri3([usize; 3]),
    Quad4([usize; 4]),
}

impl Element {
    pub fn nodes(&self) -> &[usize] {
        match self {
            Element::Tri3(nodes) => nodes,
            Element::Quad4(nodes) => nodes,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Element::Tri3(_) => ElementType::Tri3,
            Element::Quad4(_) => ElementType::Quad4,
        }
    }
}

/// Structured mesh of a `[0, width] x [0, height]` rectangle
///
/// Nodes are stored row-major with x increasing fastest, so node `(i, j)` of
/// the grid (row `i`, column `j`) has index `i * (divisions_x + 1) + j`.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) divisions_x: usize,
    pub(crate) divisions_y: usize,
    pub(crate) element_type: ElementType,
    pub(crate) nodes: Vec<Vertex>,
    pub(crate) elements: Vec<Element>,
}

impl Mesh {
    pub fn width(&self) -> f64 {
        self.width
    }
    pub fn height(&self) -> f64 {
        self.height
    }
    pub fn divisions_x(&self) -> usize {
        self.divisions_x
    }
    pub fn divisions_y(&self) -> usize {
        self.divisions_y
    }
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }
    pub fn nodes(&self) -> &[Vertex] {
        &self.nodes
    }
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }
}

/// Reaction (zeroth order) term of the equation.
///
/// Chosen explicitly by the caller; the assembler never infers it from the
/// coefficient values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReactionTerm {
    #[default]
    None,
    /// One `beta` coefficient per element
    Constant(Vec<f64>),
}

/// Per-element material coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub alpha_x: Vec<f64>,
    pub alpha_y: Vec<f64>,
    pub reaction: ReactionTerm,
}

impl Coefficients {
    /// Builds coefficients that are the same on every element
    ///
    /// # Arguments
    /// * `num_elements` - The number of elements in the mesh
    /// * `alpha_x` - Diffusion coefficient in the x direction
    /// * `alpha_y` - Diffusion coefficient in the y direction
    /// * `beta` - Reaction coefficient, or `None` to disable the reaction term
    pub fn uniform(num_elements: usize, alpha_x: f64, alpha_y: f64, beta: Option<f64>) -> Self {
        Coefficients {
            alpha_x: vec![alpha_x; num_elements],
            alpha_y: vec![alpha_y; num_elements],
            reaction: match beta {
                Some(beta) => ReactionTerm::Constant(vec![beta; num_elements]),
                None => ReactionTerm::None,
            },
        }
    }
}

/// Dense global stiffness matrix and load vector
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSystem {
    pub stiffness: DMatrix<f64>,
    pub load: DVector<f64>,
}

impl GlobalSystem {
    pub fn zeros(num_nodes: usize) -> Self {
        GlobalSystem {
            stiffness: DMatrix::zeros(num_nodes, num_nodes),
            load: DVector::zeros(num_nodes),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.load.nrows()
    }
}

/// Prescribed value of the unknown at a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletConstraint {
    pub node: usize,
    pub value: f64,
}

/// A material coefficient given either once for the whole domain or per element
#[derive(Debug, Clone, PartialEq)]
pub enum CoefficientField {
    Uniform(f64),
    PerElement(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub alpha_x: CoefficientField,
    pub alpha_y: CoefficientField,
    /// `None` disables the reaction term
    pub beta: Option<CoefficientField>,
}

/// Where the nodal source values come from
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SourceField {
    #[default]
    Zero,
    Uniform(f64),
    Values(Vec<f64>),
    /// Rows of 8-bit grayscale intensities, one pixel per node
    Bitmap(Vec<Vec<u8>>),
    /// Path of a bmp or png image read in grayscale, one pixel per node
    BitmapFile(String),
}

/// Everything needed to set up and solve one boundary value problem
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub width: f64,
    pub height: f64,
    pub divisions_x: usize,
    pub divisions_y: usize,
    pub element_type: ElementType,
    pub material: Material,
    pub source: SourceField,
    pub boundary_value: f64,
}

/// Result of a full mesh, assemble, constrain and solve run
#[derive(Debug, Clone)]
pub struct Solution {
    pub mesh: Mesh,
    /// The constrained system that was solved
    pub system: GlobalSystem,
    /// Nodal values of the unknown
    pub values: DVector<f64>,
    /// Nodes that received the boundary value
    pub constrained: Vec<usize>,
}
