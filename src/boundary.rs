use tracing::{info, warn};

use crate::{
    datatypes::{DirichletConstraint, GlobalSystem, Vertex},
    error::FemError,
};

/// Whether a node lies on the edge of the `[0, width] x [0, height]` domain
///
/// Exact comparison is fine here since the mesher places the last row and
/// column of nodes exactly on `width` and `height`.
pub fn is_on_boundary(vertex: &Vertex, width: f64, height: f64) -> bool {
    vertex.x == 0.0 || vertex.x == width || vertex.y == 0.0 || vertex.y == height
}

/// Finds the nodes on the domain boundary
///
/// # Arguments
/// * `width` - Extent of the domain in the x direction
/// * `height` - Extent of the domain in the y direction
/// * `nodes` - The node list of the mesh
///
/// # Returns
/// The boundary node indices in increasing order
pub fn boundary_nodes(width: f64, height: f64, nodes: &[Vertex]) -> Vec<usize> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, vertex)| is_on_boundary(vertex, width, height))
        .map(|(i, _)| i)
        .collect()
}

/// Fixes the value of the unknown at the given nodes
///
/// For each constrained node `k` with value `v` the column `k` times `v` is
/// moved to the load vector, row and column `k` are cleared, and the
/// equation for `k` becomes `u_k = v`.
///
/// # Arguments
/// * `constraints` - The nodes to fix and their values
/// * `system` - The assembled global system, modified in place
pub fn fix_nodes(
    constraints: &[DirichletConstraint],
    system: &mut GlobalSystem,
) -> Result<(), FemError> {
    let num_nodes = system.num_nodes();
    if let Some(bad) = constraints.iter().find(|c| c.node >= num_nodes) {
        return Err(FemError::Input(format!(
            "Boundary constraint on node {} but the system only has {} nodes",
            bad.node, num_nodes
        )));
    }

    for &DirichletConstraint { node: k, value } in constraints {
        for j in (0..num_nodes).filter(|&j| j != k) {
            system.load[j] -= system.stiffness[(j, k)] * value;
        }

        system.stiffness.column_mut(k).fill(0.0);
        system.stiffness.row_mut(k).fill(0.0);
        system.stiffness[(k, k)] = 1.0;
        system.load[k] = value;
    }

    Ok(())
}

/// Applies the same prescribed value on every boundary node
///
/// # Arguments
/// * `width` - Extent of the domain in the x direction
/// * `height` - Extent of the domain in the y direction
/// * `nodes` - The node list of the mesh
/// * `system` - The assembled global system, modified in place
/// * `value` - The prescribed value
///
/// # Returns
/// The constrained node indices. When none is found the system is left as it
/// was and will most likely be singular.
pub fn apply_dirichlet_bc(
    width: f64,
    height: f64,
    nodes: &[Vertex],
    system: &mut GlobalSystem,
    value: f64,
) -> Result<Vec<usize>, FemError> {
    if nodes.len() != system.num_nodes() {
        return Err(FemError::CoefficientLength {
            name: "nodes",
            expected: system.num_nodes(),
            found: nodes.len(),
        });
    }

    let constrained = boundary_nodes(width, height, nodes);
    if constrained.is_empty() {
        warn!("no nodes lie on the domain boundary; system left unconstrained");
        return Ok(constrained);
    }

    let constraints: Vec<DirichletConstraint> = constrained
        .iter()
        .map(|&node| DirichletConstraint { node, value })
        .collect();
    fix_nodes(&constraints, system)?;

    info!(
        "applied dirichlet value {} on {} boundary nodes",
        value,
        constrained.len()
    );

    Ok(constrained)
}
