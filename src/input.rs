use json::JsonValue;
use tracing::{info, warn};

use crate::{
    datatypes::{
        CoefficientField, Coefficients, ElementType, Material, Problem, ReactionTerm, SourceField,
    },
    error::FemError,
    source::{load_bitmap, source_from_bitmap, uniform_source},
};

/// Loads and parses the problem file
///
/// # Arguments
/// * `input_file` - The path to the input file
///
/// # Returns
/// A Problem instance
pub fn load_problem(input_file: &str) -> Result<Problem, FemError> {
    let file_string = match std::fs::read_to_string(input_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(FemError::Input(format!(
                "Unable to open input file {input_file}: {err}"
            )))
        }
    };

    let problem = parse_problem(&file_string)?;
    info!("loaded problem from {}", input_file);

    Ok(problem)
}

/// Parses a problem from the text of a json input file
pub fn parse_problem(contents: &str) -> Result<Problem, FemError> {
    let input_json = match json::parse(contents) {
        Ok(f) => f,
        Err(err) => return Err(FemError::Input(format!("Error in input file json: {err}"))),
    };

    for section in ["domain", "mesh", "material"] {
        if !input_json.has_key(section) {
            return Err(FemError::Input(format!(
                "Input json missing {section} field"
            )));
        }
    }

    let domain = &input_json["domain"];
    let mesh = &input_json["mesh"];

    let element_type = if mesh.has_key("element_type") {
        match mesh["element_type"].as_str() {
            Some(s) => s.parse::<ElementType>()?,
            None => {
                return Err(FemError::Input(
                    "element_type in mesh section must be a string".to_owned(),
                ))
            }
        }
    } else {
        ElementType::default()
    };

    let boundary_value = if input_json.has_key("boundary_value") {
        required_f64(&input_json, "boundary_value", "input file")?
    } else {
        warn!("no boundary_value in input file. Assuming zero.");
        0.0
    };

    Ok(Problem {
        width: required_f64(domain, "width", "domain")?,
        height: required_f64(domain, "height", "domain")?,
        divisions_x: required_usize(mesh, "divisions_x", "mesh")?,
        divisions_y: required_usize(mesh, "divisions_y", "mesh")?,
        element_type,
        material: parse_material(&input_json["material"])?,
        source: parse_source(&input_json["source"])?,
        boundary_value,
    })
}

fn required_f64(section: &JsonValue, key: &str, section_name: &str) -> Result<f64, FemError> {
    match section[key].as_f64() {
        Some(v) => Ok(v),
        None => Err(FemError::Input(format!(
            "Input json missing numeric {key} field in {section_name} section"
        ))),
    }
}

fn required_usize(section: &JsonValue, key: &str, section_name: &str) -> Result<usize, FemError> {
    match section[key].as_usize() {
        Some(v) => Ok(v),
        None => Err(FemError::Input(format!(
            "Input json missing non-negative integer {key} field in {section_name} section"
        ))),
    }
}

fn parse_f64_array(value: &JsonValue, name: &str) -> Result<Vec<f64>, FemError> {
    value
        .members()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| FemError::Input(format!("Non-numeric value in {name}")))
        })
        .collect()
}

/// A coefficient is either a single number or an array with one entry per element
fn parse_coefficient(value: &JsonValue, name: &str) -> Result<CoefficientField, FemError> {
    if let Some(v) = value.as_f64() {
        Ok(CoefficientField::Uniform(v))
    } else if value.is_array() {
        Ok(CoefficientField::PerElement(parse_f64_array(value, name)?))
    } else {
        Err(FemError::Input(format!(
            "Material {name} must be a number or an array of numbers"
        )))
    }
}

fn parse_material(material: &JsonValue) -> Result<Material, FemError> {
    for key in ["alpha_x", "alpha_y"] {
        if !material.has_key(key) {
            return Err(FemError::Input(format!(
                "Input json missing {key} field in material section"
            )));
        }
    }

    let beta = if material.has_key("beta") {
        Some(parse_coefficient(&material["beta"], "beta")?)
    } else {
        None
    };

    Ok(Material {
        alpha_x: parse_coefficient(&material["alpha_x"], "alpha_x")?,
        alpha_y: parse_coefficient(&material["alpha_y"], "alpha_y")?,
        beta,
    })
}

fn parse_source(source: &JsonValue) -> Result<SourceField, FemError> {
    if source.is_null() {
        return Ok(SourceField::Zero);
    }

    if source.has_key("uniform") {
        Ok(SourceField::Uniform(required_f64(source, "uniform", "source")?))
    } else if source.has_key("values") {
        Ok(SourceField::Values(parse_f64_array(&source["values"], "source values")?))
    } else if source.has_key("bitmap") {
        let mut rows: Vec<Vec<u8>> = Vec::new();
        for row in source["bitmap"].members() {
            let pixels: Option<Vec<u8>> = row.members().map(|p| p.as_u8()).collect();
            match pixels {
                Some(pixels) => rows.push(pixels),
                None => {
                    return Err(FemError::Input(
                        "Bitmap pixels must be integers between 0 and 255".to_owned(),
                    ))
                }
            }
        }
        Ok(SourceField::Bitmap(rows))
    } else if source.has_key("bitmap_file") {
        match source["bitmap_file"].as_str() {
            Some(path) => Ok(SourceField::BitmapFile(path.to_owned())),
            None => Err(FemError::Input(
                "bitmap_file in source section must be a string".to_owned(),
            )),
        }
    } else {
        Err(FemError::Input(
            "Source section needs one of uniform, values, bitmap or bitmap_file".to_owned(),
        ))
    }
}

fn resolve_field(
    field: &CoefficientField,
    name: &'static str,
    num_elements: usize,
) -> Result<Vec<f64>, FemError> {
    match field {
        CoefficientField::Uniform(v) => Ok(vec![*v; num_elements]),
        CoefficientField::PerElement(values) if values.len() == num_elements => Ok(values.clone()),
        CoefficientField::PerElement(values) => Err(FemError::CoefficientLength {
            name,
            expected: num_elements,
            found: values.len(),
        }),
    }
}

/// Expands the material description into per-element coefficients
///
/// # Arguments
/// * `material` - The material description
/// * `num_elements` - The number of elements in the mesh
pub fn resolve_coefficients(
    material: &Material,
    num_elements: usize,
) -> Result<Coefficients, FemError> {
    let reaction = match &material.beta {
        Some(beta) => ReactionTerm::Constant(resolve_field(beta, "beta", num_elements)?),
        None => ReactionTerm::None,
    };

    Ok(Coefficients {
        alpha_x: resolve_field(&material.alpha_x, "alpha_x", num_elements)?,
        alpha_y: resolve_field(&material.alpha_y, "alpha_y", num_elements)?,
        reaction,
    })
}

/// Expands the source description into one value per node
pub fn resolve_source(source: &SourceField, num_nodes: usize) -> Result<Vec<f64>, FemError> {
    match source {
        SourceField::Zero => Ok(uniform_source(num_nodes, 0.0)),
        SourceField::Uniform(v) => Ok(uniform_source(num_nodes, *v)),
        SourceField::Values(values) => {
            if values.len() != num_nodes {
                return Err(FemError::CoefficientLength {
                    name: "source",
                    expected: num_nodes,
                    found: values.len(),
                });
            }
            Ok(values.clone())
        }
        SourceField::Bitmap(pixels) => source_from_bitmap(pixels, num_nodes),
        SourceField::BitmapFile(path) => source_from_bitmap(&load_bitmap(path)?, num_nodes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_INPUT: &str = r#"{
        "domain": { "width": 2.0, "height": 1.0 },
        "mesh": { "divisions_x": 2, "divisions_y": 1, "element_type": "2DTR3N" },
        "material": { "alpha_x": 1.0, "alpha_y": [1, 2, 3, 4], "beta": 0.5 },
        "source": { "bitmap": [[255, 0, 255], [255, 255, 10]] },
        "boundary_value": 3.0
    }"#;

    #[test]
    fn parses_full_problem() {
        let problem = parse_problem(FULL_INPUT).unwrap();

        assert_eq!(problem.width, 2.0);
        assert_eq!(problem.height, 1.0);
        assert_eq!(problem.divisions_x, 2);
        assert_eq!(problem.divisions_y, 1);
        assert_eq!(problem.element_type, ElementType::Tri3);
        assert_eq!(problem.material.alpha_x, CoefficientField::Uniform(1.0));
        assert_eq!(
            problem.material.alpha_y,
            CoefficientField::PerElement(vec![1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(problem.material.beta, Some(CoefficientField::Uniform(0.5)));
        assert_eq!(problem.boundary_value, 3.0);

        let source = resolve_source(&problem.source, 6).unwrap();
        assert_eq!(source, vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_beta_disables_reaction() {
        let problem = parse_problem(
            r#"{
                "domain": { "width": 1, "height": 1 },
                "mesh": { "divisions_x": 1, "divisions_y": 1 },
                "material": { "alpha_x": 1, "alpha_y": 1 }
            }"#,
        )
        .unwrap();

        assert_eq!(problem.source, SourceField::Zero);
        assert_eq!(problem.boundary_value, 0.0);

        let coefficients = resolve_coefficients(&problem.material, 2).unwrap();
        assert_eq!(coefficients.reaction, ReactionTerm::None);
        assert_eq!(coefficients.alpha_x, vec![1.0, 1.0]);
    }

    #[test]
    fn zero_beta_still_enables_reaction() {
        let material = Material {
            alpha_x: CoefficientField::Uniform(1.0),
            alpha_y: CoefficientField::Uniform(1.0),
            beta: Some(CoefficientField::Uniform(0.0)),
        };
        let coefficients = resolve_coefficients(&material, 3).unwrap();
        assert_eq!(coefficients.reaction, ReactionTerm::Constant(vec![0.0; 3]));
    }

    #[test]
    fn per_element_length_is_checked() {
        let material = Material {
            alpha_x: CoefficientField::PerElement(vec![1.0, 2.0]),
            alpha_y: CoefficientField::Uniform(1.0),
            beta: None,
        };
        assert!(matches!(
            resolve_coefficients(&material, 4),
            Err(FemError::CoefficientLength {
                name: "alpha_x",
                expected: 4,
                found: 2
            })
        ));
    }

    #[test]
    fn reports_missing_sections() {
        let err = parse_problem(r#"{ "domain": { "width": 1, "height": 1 } }"#).unwrap_err();
        assert!(matches!(err, FemError::Input(msg) if msg.contains("mesh")));

        let err = parse_problem("not json").unwrap_err();
        assert!(matches!(err, FemError::Input(_)));
    }

    #[test]
    fn bitmap_file_source_is_read_at_resolve_time() {
        let problem = parse_problem(
            r#"{
                "domain": { "width": 1, "height": 1 },
                "mesh": { "divisions_x": 1, "divisions_y": 1 },
                "material": { "alpha_x": 1, "alpha_y": 1 },
                "source": { "bitmap_file": "/nonexistent/trifem/rho.bmp" }
            }"#,
        )
        .unwrap();

        assert_eq!(
            problem.source,
            SourceField::BitmapFile("/nonexistent/trifem/rho.bmp".to_owned())
        );
        assert!(matches!(
            resolve_source(&problem.source, 4),
            Err(FemError::Input(msg)) if msg.contains("rho.bmp")
        ));
    }

    #[test]
    fn rejects_unknown_element_type() {
        let err = parse_problem(
            r#"{
                "domain": { "width": 1, "height": 1 },
                "mesh": { "divisions_x": 1, "divisions_y": 1, "element_type": "hex8" },
                "material": { "alpha_x": 1, "alpha_y": 1 }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, FemError::Input(_)));
    }
}
