use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use trifem::{
    datatypes::{ElementType, Problem},
    error::FemError,
    input, mesher, post_processor, solver,
};

/// Solves a generalized Poisson problem on a rectangle with linear triangles
#[derive(Parser, Debug)]
#[command(name = "trifem", version)]
struct Args {
    /// Problem description in json
    input: String,

    /// Override the number of elements in the x direction
    #[arg(long)]
    divisions_x: Option<usize>,

    /// Override the number of elements in the y direction
    #[arg(long)]
    divisions_y: Option<usize>,

    /// Override the element type (2DTR3N or 2DQU4N)
    #[arg(long)]
    element_type: Option<ElementType>,

    /// Override the value prescribed on the boundary
    #[arg(long, allow_hyphen_values = true)]
    boundary_value: Option<f64>,

    /// Only generate the mesh and print its nodes and elements
    #[arg(long)]
    mesh_only: bool,
}

fn apply_overrides(problem: &mut Problem, args: &Args) {
    if let Some(p) = args.divisions_x {
        problem.divisions_x = p;
    }
    if let Some(m) = args.divisions_y {
        problem.divisions_y = m;
    }
    if let Some(element_type) = args.element_type {
        problem.element_type = element_type;
    }
    if let Some(v) = args.boundary_value {
        problem.boundary_value = v;
    }
}

fn print_mesh(problem: &Problem) -> Result<(), FemError> {
    let mesh = mesher::uniform_mesh(
        problem.width,
        problem.height,
        problem.divisions_x,
        problem.divisions_y,
        problem.element_type,
    )?;

    println!("node,x,y");
    for (i, node) in mesh.nodes().iter().enumerate() {
        println!("{i},{},{}", node.x, node.y);
    }

    println!("element,nodes,centroid_x,centroid_y");
    for (element, label) in mesh
        .elements()
        .iter()
        .zip(post_processor::element_labels(&mesh))
    {
        let nodes: Vec<String> = element.nodes().iter().map(|n| n.to_string()).collect();
        println!(
            "{},{},{},{}",
            label.label,
            nodes.join(" "),
            label.position.x,
            label.position.y
        );
    }

    println!("segment,x0,y0,x1,y1");
    for (k, (a, b)) in post_processor::wireframe(&mesh).iter().enumerate() {
        println!("{k},{},{},{},{}", a.x, a.y, b.x, b.y);
    }

    Ok(())
}

fn run(args: &Args) -> Result<(), FemError> {
    let mut problem = input::load_problem(&args.input)?;
    apply_overrides(&mut problem, args);

    if args.mesh_only {
        return print_mesh(&problem);
    }

    let solution = solver::run(&problem)?;
    post_processor::summary(&solution.values);

    let surface = post_processor::nodal_surface(&solution.mesh, &solution.values)?;
    println!("{surface:.6}");

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
