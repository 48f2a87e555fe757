//! Linear triangle finite elements for a generalized Poisson equation
//! `-(d/dx alpha_x du/dx + d/dy alpha_y du/dy) + beta u = f` on a rectangle.
//!
//! The pipeline is [`mesher::uniform_mesh`] -> [`assembler::assemble`] ->
//! [`boundary::apply_dirichlet_bc`] -> [`solver::solve`]. Node indices are
//! 0-based throughout.

pub mod assembler;
pub mod boundary;
pub mod datatypes;
pub mod error;
pub mod input;
pub mod mesher;
pub mod post_processor;
pub mod solver;
pub mod source;

pub use datatypes::{
    Coefficients, DirichletConstraint, Element, ElementType, GlobalSystem, Mesh, Problem,
    ReactionTerm, Solution, Vertex,
};
pub use error::FemError;
