use tracing::{debug, info};

use crate::{
    datatypes::{Element, ElementType, Mesh, Vertex},
    error::FemError,
};

/// Checks the domain size and division counts before anything is allocated
fn validate_parameters(
    width: f64,
    height: f64,
    divisions_x: usize,
    divisions_y: usize,
) -> Result<(), FemError> {
    if !(width.is_finite() && width > 0.0) {
        return Err(FemError::InvalidMeshParameters(format!(
            "width must be positive, got {width}"
        )));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(FemError::InvalidMeshParameters(format!(
            "height must be positive, got {height}"
        )));
    }
    if divisions_x == 0 {
        return Err(FemError::InvalidMeshParameters(
            "number of divisions in x must be at least 1".to_owned(),
        ));
    }
    if divisions_y == 0 {
        return Err(FemError::InvalidMeshParameters(
            "number of divisions in y must be at least 1".to_owned(),
        ));
    }

    // node and element buffers must be addressable
    let num_nodes = divisions_x
        .checked_add(1)
        .zip(divisions_y.checked_add(1))
        .and_then(|(nx, ny)| nx.checked_mul(ny))
        .filter(|n| fits_allocation::<Vertex>(*n));
    let num_elements = divisions_x
        .checked_mul(divisions_y)
        .and_then(|n| n.checked_mul(2))
        .filter(|n| fits_allocation::<Element>(*n));
    if num_nodes.is_none() || num_elements.is_none() {
        return Err(FemError::InvalidMeshParameters(format!(
            "{divisions_x} x {divisions_y} divisions is too many to mesh"
        )));
    }

    Ok(())
}

fn fits_allocation<T>(count: usize) -> bool {
    count
        .checked_mul(std::mem::size_of::<T>())
        .is_some_and(|bytes| bytes <= isize::MAX as usize)
}

/// Places the grid nodes row by row, x increasing fastest
///
/// The last column and row are set to `width` and `height` directly so that
/// boundary nodes can later be found by exact comparison.
fn build_nodes(width: f64, height: f64, divisions_x: usize, divisions_y: usize) -> Vec<Vertex> {
    let dx = width / divisions_x as f64;
    let dy = height / divisions_y as f64;

    let mut nodes = Vec::with_capacity((divisions_x + 1) * (divisions_y + 1));
    for i in 0..=divisions_y {
        let y = if i == divisions_y { height } else { i as f64 * dy };
        for j in 0..=divisions_x {
            let x = if j == divisions_x { width } else { j as f64 * dx };
            nodes.push(Vertex { x, y });
        }
    }

    nodes
}

/// Builds one quadrilateral per grid cell, counter-clockwise from the lower
/// left corner: (bottom-left, bottom-right, top-right, top-left)
///
/// Every cell after the first in a row takes its left edge from the right
/// edge of the previous cell.
fn build_quads(divisions_x: usize, divisions_y: usize) -> Vec<[usize; 4]> {
    let row_len = divisions_x + 1;
    let mut quads: Vec<[usize; 4]> = Vec::with_capacity(divisions_x * divisions_y);

    for i in 0..divisions_y {
        for j in 0..divisions_x {
            let (bottom_left, top_left) = if j == 0 {
                let bottom_left = i * row_len;
                (bottom_left, bottom_left + row_len)
            } else {
                // right edge of the previous cell
                let previous = quads[quads.len() - 1];
                (previous[1], previous[2])
            };

            quads.push([bottom_left, bottom_left + 1, top_left + 1, top_left]);
        }
    }

    quads
}

/// Splits every quadrilateral along its bottom-left to top-right diagonal
///
/// # Arguments
/// * `quads` - The quadrilaterals in emission order
///
/// # Returns
/// Two triangles per quadrilateral, (bl, br, tr) followed by (bl, tr, tl)
fn split_quads(quads: &[[usize; 4]]) -> Vec<[usize; 3]> {
    quads
        .iter()
        .flat_map(|&[bl, br, tr, tl]| [[bl, br, tr], [bl, tr, tl]])
        .collect()
}

/// Discretizes a rectangle into a structured mesh
///
/// # Arguments
/// * `width` - Extent of the domain in the x direction
/// * `height` - Extent of the domain in the y direction
/// * `divisions_x` - Number of cells in the x direction
/// * `divisions_y` - Number of cells in the y direction
/// * `element_type` - Quadrilateral cells, or triangles obtained by splitting them
///
/// # Returns
/// A Mesh with `(divisions_x + 1) * (divisions_y + 1)` nodes and either
/// `divisions_x * divisions_y` quadrilaterals or twice as many triangles
pub fn uniform_mesh(
    width: f64,
    height: f64,
    divisions_x: usize,
    divisions_y: usize,
    element_type: ElementType,
) -> Result<Mesh, FemError> {
    validate_parameters(width, height, divisions_x, divisions_y)?;

    let nodes = build_nodes(width, height, divisions_x, divisions_y);
    let quads = build_quads(divisions_x, divisions_y);

    let elements: Vec<Element> = match element_type {
        ElementType::Quad4 => quads.into_iter().map(Element::Quad4).collect(),
        ElementType::Tri3 => split_quads(&quads)
            .into_iter()
            .map(Element::Tri3)
            .collect(),
    };

    debug!(
        "mesh spacing dx={} dy={}",
        width / divisions_x as f64,
        height / divisions_y as f64
    );
    info!(
        "generated {} mesh with {} nodes and {} elements",
        element_type,
        nodes.len(),
        elements.len()
    );

    Ok(Mesh {
        width,
        height,
        divisions_x,
        divisions_y,
        element_type,
        nodes,
        elements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_area(mesh: &Mesh, nodes: &[usize]) -> f64 {
        let v: Vec<&Vertex> = nodes.iter().map(|&n| &mesh.nodes()[n]).collect();
        let mut twice_area = 0.0;
        for k in 0..v.len() {
            let (a, b) = (v[k], v[(k + 1) % v.len()]);
            twice_area += a.x * b.y - b.x * a.y;
        }
        0.5 * twice_area
    }

    #[test]
    fn unit_square_single_cell_triangles() {
        let mesh = uniform_mesh(1.0, 1.0, 1, 1, ElementType::Tri3).unwrap();

        assert_eq!(
            mesh.nodes(),
            &[
                Vertex { x: 0.0, y: 0.0 },
                Vertex { x: 1.0, y: 0.0 },
                Vertex { x: 0.0, y: 1.0 },
                Vertex { x: 1.0, y: 1.0 },
            ]
        );
        assert_eq!(
            mesh.elements(),
            &[Element::Tri3([0, 1, 3]), Element::Tri3([0, 3, 2])]
        );
        for element in mesh.elements() {
            assert_eq!(signed_area(&mesh, element.nodes()), 0.5);
        }
    }

    #[test]
    fn quad_connectivity_shares_edges() {
        let mesh = uniform_mesh(3.0, 2.0, 3, 2, ElementType::Quad4).unwrap();

        assert_eq!(
            mesh.elements(),
            &[
                Element::Quad4([0, 1, 5, 4]),
                Element::Quad4([1, 2, 6, 5]),
                Element::Quad4([2, 3, 7, 6]),
                Element::Quad4([4, 5, 9, 8]),
                Element::Quad4([5, 6, 10, 9]),
                Element::Quad4([6, 7, 11, 10]),
            ]
        );
    }

    #[test]
    fn node_and_element_counts() {
        for (p, m) in [(1, 1), (2, 3), (5, 1), (7, 4)] {
            let quad = uniform_mesh(2.0, 1.5, p, m, ElementType::Quad4).unwrap();
            assert_eq!(quad.num_nodes(), (p + 1) * (m + 1));
            assert_eq!(quad.num_elements(), p * m);

            let tri = uniform_mesh(2.0, 1.5, p, m, ElementType::Tri3).unwrap();
            assert_eq!(tri.num_nodes(), (p + 1) * (m + 1));
            assert_eq!(tri.num_elements(), 2 * p * m);
        }
    }

    #[test]
    fn elements_are_counter_clockwise() {
        for element_type in [ElementType::Quad4, ElementType::Tri3] {
            let mesh = uniform_mesh(0.7, 1.3, 4, 3, element_type).unwrap();
            for element in mesh.elements() {
                assert!(signed_area(&mesh, element.nodes()) > 0.0);
            }
        }
    }

    #[test]
    fn every_node_is_used() {
        let mesh = uniform_mesh(1.0, 1.0, 3, 2, ElementType::Tri3).unwrap();
        let mut used = vec![false; mesh.num_nodes()];
        for element in mesh.elements() {
            for &node in element.nodes() {
                used[node] = true;
            }
        }
        assert!(used.iter().all(|&u| u));
    }

    #[test]
    fn domain_endpoints_are_exact() {
        let mesh = uniform_mesh(0.3, 0.7, 7, 3, ElementType::Tri3).unwrap();
        let last = mesh.nodes()[mesh.num_nodes() - 1];
        assert_eq!(last, Vertex { x: 0.3, y: 0.7 });
        assert_eq!(mesh.nodes()[7].x, 0.3);
    }

    #[test]
    fn rejects_overflowing_divisions() {
        assert!(matches!(
            uniform_mesh(1.0, 1.0, usize::MAX, 1, ElementType::Tri3),
            Err(FemError::InvalidMeshParameters(_))
        ));
        assert!(matches!(
            uniform_mesh(1.0, 1.0, 1, usize::MAX, ElementType::Quad4),
            Err(FemError::InvalidMeshParameters(_))
        ));
        assert!(matches!(
            uniform_mesh(1.0, 1.0, usize::MAX / 2, 4, ElementType::Tri3),
            Err(FemError::InvalidMeshParameters(_))
        ));
        assert!(matches!(
            uniform_mesh(1.0, 1.0, 1 << 31, 1 << 31, ElementType::Tri3),
            Err(FemError::InvalidMeshParameters(_))
        ));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            uniform_mesh(1.0, 1.0, 0, 2, ElementType::Tri3),
            Err(FemError::InvalidMeshParameters(_))
        ));
        assert!(matches!(
            uniform_mesh(1.0, 1.0, 2, 0, ElementType::Quad4),
            Err(FemError::InvalidMeshParameters(_))
        ));
        assert!(matches!(
            uniform_mesh(0.0, 1.0, 2, 2, ElementType::Tri3),
            Err(FemError::InvalidMeshParameters(_))
        ));
        assert!(matches!(
            uniform_mesh(1.0, -2.0, 2, 2, ElementType::Tri3),
            Err(FemError::InvalidMeshParameters(_))
        ));
    }
}
