//! Builds the `tracing-subscriber` filter string from [`LoggingConfig`].

/// Build a filter directives string from a [`crate::config::LoggingConfig`].
///
/// Format: `"base_level,ogre::component1=level1,ogre::component2=level2"`.
///
/// ```
/// use ogre::config::LoggingConfig;
/// use ogre::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("docker".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: ogre::config::LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,ogre::docker=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        for (component, level) in component_levels {
            filter_str.push_str(&format!(",ogre::{component}={level}"));
        }
    }

    filter_str
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::collections::HashMap;

    #[test]
    fn bare_level_with_no_component_overrides() {
        let config = crate::config::LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        };
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn appends_component_overrides() {
        let mut component_levels = HashMap::new();
        component_levels.insert("docker".to_string(), "debug".to_string());
        let config = crate::config::LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Json,
            component_levels: Some(component_levels),
        };
        assert_eq!(build_filter_directives(&config), "info,ogre::docker=debug");
    }
}
