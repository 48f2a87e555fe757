use indicatif::ProgressBar;
use nalgebra::{Matrix3, Vector3};
use tracing::{debug, info};

use crate::{
    datatypes::{Coefficients, Element, GlobalSystem, ReactionTerm, Vertex},
    error::FemError,
};

/// Calculates the signed area of a triangle
///
/// # Arguments
/// * `vertices` - The triangle corners in element order
///
/// # Returns
/// The area of the triangle, positive when the corners are counter-clockwise
pub fn compute_element_area(vertices: &[Vertex; 3]) -> f64 {
    let [v1, v2, v3] = vertices;

    let x21 = v2.x - v1.x;
    let x31 = v3.x - v1.x;
    let y21 = v2.y - v1.y;
    let y31 = v3.y - v1.y;

    0.5 * (x21 * y31 - x31 * y21)
}

/// Calculates the diffusion matrix of a linear triangle
///
/// Each local node is paired with the edge opposite to it: node 1 with edge
/// 2-3, node 2 with edge 3-1 and node 3 with edge 1-2.
///
/// # Arguments
/// * `vertices` - The triangle corners in element order
/// * `element_area` - The signed area of the element
/// * `alpha_x` - Diffusion coefficient in the x direction
/// * `alpha_y` - Diffusion coefficient in the y direction
///
/// # Returns
/// A symmetric 3x3 matrix
pub fn compute_diffusion_matrix(
    vertices: &[Vertex; 3],
    element_area: f64,
    alpha_x: f64,
    alpha_y: f64,
) -> Matrix3<f64> {
    let [v1, v2, v3] = vertices;

    let x21 = v2.x - v1.x;
    let x32 = v3.x - v2.x;
    let x13 = v1.x - v3.x;
    let y12 = v1.y - v2.y;
    let y31 = v3.y - v1.y;
    let y23 = v2.y - v3.y;

    let ys = Vector3::new(y23, y31, y12);
    let xs = Vector3::new(x32, x13, x21);

    -(ys * ys.transpose() * alpha_x + xs * xs.transpose() * alpha_y) / (4.0 * element_area)
}

/// Calculates the reaction (mass) matrix of a linear triangle
///
/// # Arguments
/// * `element_area` - The signed area of the element
/// * `beta` - Reaction coefficient of the element
///
/// # Returns
/// A 3x3 matrix with `beta*A/6` on the diagonal and `beta*A/12` elsewhere
pub fn compute_reaction_matrix(element_area: f64, beta: f64) -> Matrix3<f64> {
    let off_diagonal = beta * element_area / 12.0;
    Matrix3::from_element(off_diagonal) + Matrix3::from_diagonal_element(off_diagonal)
}

/// Lumps the nodal source values onto the element nodes
///
/// # Arguments
/// * `element_area` - The signed area of the element
/// * `sources` - Source value at each element node
pub fn compute_element_load(element_area: f64, sources: [f64; 3]) -> Vector3<f64> {
    Vector3::from(sources) * element_area / 3.0
}

fn check_length(name: &'static str, expected: usize, found: usize) -> Result<(), FemError> {
    if expected != found {
        return Err(FemError::CoefficientLength {
            name,
            expected,
            found,
        });
    }
    Ok(())
}

/// Looks up the corners of a triangular element
///
/// # Arguments
/// * `element_idx` - Position of the element, used for error reporting
/// * `element` - The element to target
/// * `nodes` - The node list of the mesh
fn element_vertices(
    element_idx: usize,
    element: &Element,
    nodes: &[Vertex],
) -> Result<([usize; 3], [Vertex; 3]), FemError> {
    let element_nodes = match element {
        Element::Tri3(element_nodes) => *element_nodes,
        Element::Quad4(_) => {
            return Err(FemError::UnsupportedElementType(element.element_type()));
        }
    };

    for &node in &element_nodes {
        if node >= nodes.len() {
            return Err(FemError::IndexOutOfRange {
                element: element_idx,
                node,
                num_nodes: nodes.len(),
            });
        }
    }

    Ok((element_nodes, element_nodes.map(|n| nodes[n])))
}

/// Computes the local stiffness matrix and load vector of one element
///
/// # Arguments
/// * `e` - Position of the element in the element list
/// * `element` - The element to target
/// * `nodes` - The node list of the mesh
/// * `coefficients` - Per-element diffusion and reaction coefficients
/// * `source` - Source value at each node
///
/// # Returns
/// The global node indices of the element with its 3x3 stiffness matrix and
/// load vector
fn compute_element_system(
    e: usize,
    element: &Element,
    nodes: &[Vertex],
    coefficients: &Coefficients,
    source: &[f64],
) -> Result<([usize; 3], Matrix3<f64>, Vector3<f64>), FemError> {
    let (element_nodes, vertices) = element_vertices(e, element, nodes)?;

    let element_area = compute_element_area(&vertices);
    if !(element_area > 0.0) {
        return Err(FemError::DegenerateElement {
            element: e,
            area: element_area,
        });
    }

    let mut element_stiffness = compute_diffusion_matrix(
        &vertices,
        element_area,
        coefficients.alpha_x[e],
        coefficients.alpha_y[e],
    );
    if let ReactionTerm::Constant(beta) = &coefficients.reaction {
        element_stiffness += compute_reaction_matrix(element_area, beta[e]);
    }

    let element_load = compute_element_load(element_area, element_nodes.map(|n| source[n]));

    Ok((element_nodes, element_stiffness, element_load))
}

/// Computes the local stiffness matrix and load vector of every element and
/// adds them into the global system
///
/// Only triangular elements are supported.
///
/// # Arguments
/// * `nodes` - The node list of the mesh
/// * `elements` - The element list of the mesh
/// * `coefficients` - Per-element diffusion and reaction coefficients
/// * `source` - Source value at each node
///
/// # Returns
/// The global stiffness matrix and load vector
pub fn assemble(
    nodes: &[Vertex],
    elements: &[Element],
    coefficients: &Coefficients,
    source: &[f64],
) -> Result<GlobalSystem, FemError> {
    check_length("alpha_x", elements.len(), coefficients.alpha_x.len())?;
    check_length("alpha_y", elements.len(), coefficients.alpha_y.len())?;
    if let ReactionTerm::Constant(beta) = &coefficients.reaction {
        check_length("beta", elements.len(), beta.len())?;
    }
    check_length("source", nodes.len(), source.len())?;

    let mut system = GlobalSystem::zeros(nodes.len());

    info!("assembling {} elements...", elements.len());
    let bar = ProgressBar::new(elements.len() as u64);
    for (e, element) in elements.iter().enumerate() {
        let (element_nodes, element_stiffness, element_load) =
            match compute_element_system(e, element, nodes, coefficients, source) {
                Ok(local) => local,
                Err(err) => {
                    bar.abandon();
                    return Err(err);
                }
            };

        for (local_row, &global_row) in element_nodes.iter().enumerate() {
            for (local_col, &global_col) in element_nodes.iter().enumerate() {
                system.stiffness[(global_row, global_col)] +=
                    element_stiffness[(local_row, local_col)];
            }
            system.load[global_row] += element_load[local_row];
        }

        bar.inc(1);
    }
    bar.finish_and_clear();

    debug!(
        "reaction term {}",
        match coefficients.reaction {
            ReactionTerm::None => "disabled",
            ReactionTerm::Constant(_) => "enabled",
        }
    );
    info!(
        "assembled {}x{} global system",
        system.num_nodes(),
        system.num_nodes()
    );

    Ok(system)
}
