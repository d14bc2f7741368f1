//! How `service.name` and `service.version` are filled in when a logger's
//! initial fields leave them out.

use logkit::{Engine, Fields, Format, Level, LogOption, Logger, VersionInfo, fields};

use crate::error::DemoError;

pub struct Scenario {
    pub title: &'static str,
    pub message: &'static str,
    pub test_value: &'static str,
    pub initial_fields: Option<Fields>,
}

pub fn scenarios(version: &VersionInfo) -> Vec<Scenario> {
    vec![
        Scenario {
            title: "Logger without initial fields (should show 'unknown' values)",
            message: "Basic logger message",
            test_value: "value1",
            initial_fields: None,
        },
        Scenario {
            title: "Logger with empty initial fields (should show 'unknown' values)",
            message: "Empty initial fields message",
            test_value: "value2",
            initial_fields: Some(Fields::new()),
        },
        Scenario {
            title: "Logger with partial initial fields (service.name provided, service.version unknown)",
            message: "Partial fields message",
            test_value: "value3",
            initial_fields: Some(fields! { "service.name" => "partial-demo-service" }),
        },
        Scenario {
            title: "Logger with complete initial fields (all values provided)",
            message: "Complete fields message",
            test_value: "value4",
            initial_fields: Some(fields! {
                "service.name" => version.service_name,
                "service.version" => version.git_version,
                "environment" => "demo",
            }),
        },
        Scenario {
            title: "Logger with custom values overriding defaults",
            message: "Custom fields message",
            test_value: "value5",
            initial_fields: Some(fields! {
                "service.name" => "custom-service",
                "service.version" => "custom-version",
                "team" => "platform",
            }),
        },
    ]
}

fn option_for(scenario: &Scenario, output_paths: &[String]) -> LogOption {
    let mut option = LogOption {
        engine: Engine::Tracing,
        level: Level::Info,
        format: Format::Json,
        output_paths: output_paths.to_vec(),
        ..LogOption::default()
    };
    if let Some(fields) = &scenario.initial_fields {
        option.with_initial_fields(fields.clone());
    }
    option
}

/// Build one logger per scenario and write one record with each.
pub fn run(version: &VersionInfo, output_paths: &[String]) -> Result<(), DemoError> {
    println!("=== Default Fields Demo ===");
    println!("Demonstrating logger behavior with and without initial fields\n");

    for (index, scenario) in scenarios(version).iter().enumerate() {
        println!("{}. {}:", index + 1, scenario.title);
        let logger = Logger::new(&option_for(scenario, output_paths))?;
        logger.info_with(scenario.message, fields! { "test" => scenario.test_value });
        logger.flush();
        println!();
    }

    println!("=== Demo Complete ===");
    println!("Notice how 'service.name' and 'service.version' are always present,");
    println!("with 'unknown' as default when not explicitly provided.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_every_scenario_carries_service_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("default-fields.log");
        run(logkit::version::get(), &[path.display().to_string()]).unwrap();

        let lines: Vec<Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 5);
        for line in &lines {
            assert!(line["service.name"].is_string());
            assert!(line["service.version"].is_string());
        }
        assert_eq!(lines[0]["service.name"], "unknown");
        assert_eq!(lines[1]["service.version"], "unknown");
        assert_eq!(lines[2]["service.name"], "partial-demo-service");
        assert_eq!(lines[2]["service.version"], "unknown");
        assert_eq!(lines[3]["environment"], "demo");
        assert_eq!(lines[4]["service.name"], "custom-service");
        assert_eq!(lines[4]["team"], "platform");
        assert_eq!(lines[4]["test"], "value5");
    }
}
