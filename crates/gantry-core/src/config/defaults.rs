//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gantry.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gantry.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".gantry.toml",
        ".gantry.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gantry Configuration

version = "unspecified"

[matrix]
prefix = "testGradle"
versions = ["4.10.3", "5.6.4"]
system_property = "gradle.under.test"
category = "org.jenkinsci.gradle.plugins.jpi.UsesGradleTestKit"
test_command = "./gradlew test"
checkpoint = "check"
exception_format = "full"

[publish]
repository_name = "JenkinsCommunity"
base_url = "https://repo.jenkins-ci.org"
snapshot_suffix = "SNAPSHOT"
publication = "pluginMaven"

[signing]
username_property = "jenkins.username"
password_property = "jenkins.password"

[tasks]
concurrency = 4
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.matrix.versions.len(), 2);
        assert_eq!(config.signing.username_property, "jenkins.username");
    }

    #[test]
    fn test_default_config_toml_round_trips() {
        let rendered = default_config_toml();
        let config: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(config.publish.publication, "pluginMaven");
    }
}
