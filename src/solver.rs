use nalgebra::DVector;
use tracing::info;

use crate::{
    assembler::assemble,
    boundary::apply_dirichlet_bc,
    datatypes::{GlobalSystem, Problem, Solution},
    error::FemError,
    input::{resolve_coefficients, resolve_source},
    mesher::uniform_mesh,
};

/// Solves the constrained global system with a dense LU decomposition
///
/// # Arguments
/// * `system` - The global system with boundary conditions applied
///
/// # Returns
/// The nodal values `u` such that `K u = b`
pub fn solve(system: &GlobalSystem) -> Result<DVector<f64>, FemError> {
    let start = std::time::Instant::now();

    let solution = match system.stiffness.clone().lu().solve(&system.load) {
        Some(u) => u,
        None => {
            return Err(FemError::Solver(
                "Stiffness matrix is singular. Are any boundary conditions applied?".to_owned(),
            ))
        }
    };

    let elapsed = start.elapsed().as_secs_f32();
    info!("solved {} unknowns in {:.3} seconds", solution.nrows(), elapsed);

    Ok(solution)
}

/// Runs the whole pipeline on a problem: mesh, assemble, apply the boundary
/// value and solve
///
/// # Arguments
/// * `problem` - The problem to solve
///
/// # Returns
/// The mesh, the constrained system and its solution
pub fn run(problem: &Problem) -> Result<Solution, FemError> {
    let mesh = uniform_mesh(
        problem.width,
        problem.height,
        problem.divisions_x,
        problem.divisions_y,
        problem.element_type,
    )?;

    let coefficients = resolve_coefficients(&problem.material, mesh.num_elements())?;
    let source = resolve_source(&problem.source, mesh.num_nodes())?;

    let mut system = assemble(mesh.nodes(), mesh.elements(), &coefficients, &source)?;
    let constrained = apply_dirichlet_bc(
        mesh.width(),
        mesh.height(),
        mesh.nodes(),
        &mut system,
        problem.boundary_value,
    )?;

    let values = solve(&system)?;

    Ok(Solution {
        mesh,
        system,
        values,
        constrained,
    })
}
