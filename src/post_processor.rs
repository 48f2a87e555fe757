use nalgebra::{DMatrix, DVector};
use tracing::info;

use crate::{
    datatypes::{Mesh, Vertex},
    error::FemError,
};

/// Label placed at the centroid of an element when drawing the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLabel {
    /// 1-based element number
    pub label: usize,
    pub position: Vertex,
}

/// Computes the annotation of every element
///
/// # Arguments
/// * `mesh` - The mesh to annotate
///
/// # Returns
/// One label per element, numbered from 1 in element order
pub fn element_labels(mesh: &Mesh) -> Vec<ElementLabel> {
    let nodes = mesh.nodes();
    let corners = mesh.element_type().nodes_per_element() as f64;

    mesh.elements()
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let (sx, sy) = element
                .nodes()
                .iter()
                .fold((0.0, 0.0), |(sx, sy), &n| (sx + nodes[n].x, sy + nodes[n].y));
            ElementLabel {
                label: i + 1,
                position: Vertex {
                    x: sx / corners,
                    y: sy / corners,
                },
            }
        })
        .collect()
}

/// Lists the edge segments of every element, closing edge included
///
/// Edges shared by two elements appear once for each of them.
pub fn wireframe(mesh: &Mesh) -> Vec<(Vertex, Vertex)> {
    let nodes = mesh.nodes();

    mesh.elements()
        .iter()
        .flat_map(|element| {
            let element_nodes = element.nodes();
            (0..element_nodes.len()).map(move |k| {
                let a = element_nodes[k];
                let b = element_nodes[(k + 1) % element_nodes.len()];
                (nodes[a], nodes[b])
            })
        })
        .collect()
}

/// Arranges the nodal solution on the node grid for surface plots
///
/// # Arguments
/// * `mesh` - The mesh the solution belongs to
/// * `values` - One value per node
///
/// # Returns
/// A `(divisions_y + 1) x (divisions_x + 1)` matrix where entry `(i, j)` is
/// the value at the node in grid row `i` (y) and column `j` (x)
pub fn nodal_surface(mesh: &Mesh, values: &DVector<f64>) -> Result<DMatrix<f64>, FemError> {
    if values.nrows() != mesh.num_nodes() {
        return Err(FemError::CoefficientLength {
            name: "nodal values",
            expected: mesh.num_nodes(),
            found: values.nrows(),
        });
    }

    Ok(DMatrix::from_row_slice(
        mesh.divisions_y() + 1,
        mesh.divisions_x() + 1,
        values.as_slice(),
    ))
}

/// Logs the range and mean of the nodal solution
pub fn summary(values: &DVector<f64>) {
    if values.is_empty() {
        info!("solution is empty");
        return;
    }

    info!(
        "solution min {:.6e}, max {:.6e}, mean {:.6e}",
        values.min(),
        values.max(),
        values.mean()
    );
}
