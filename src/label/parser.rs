//! The label parser: turns a container's label map into a set of
//! [`CheckSpec`]s plus a shared [`Formatter`].

use super::error::ParseError;
use super::spec::{
    CheckSpec, ContainerIdentity, ExecutionSite, Formatter, OutputSpec, PlatformSpec,
    PlatformTarget,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TAG: &str = "ogre";
const NS_HEALTH: &str = "health";
const NS_FORMAT: &str = "format";
const SITE_INTERNAL: &str = "in";
const SITE_EXTERNAL: &str = "ex";
const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Parse a container's label map into its Check Specs and shared Formatter.
///
/// A malformed `ogre.health.*` directive is logged and skipped; it never
/// aborts parsing of the container's other labels.
pub fn parse_labels(
    labels: &HashMap<String, String>,
    container: ContainerIdentity,
) -> (Vec<CheckSpec>, Formatter) {
    let (formatter, interval) = parse_formatter(labels);
    let formatter = Arc::new(formatter);

    let mut checks = Vec::new();
    for (key, value) in labels {
        let tokens: Vec<&str> = key.split('.').collect();
        if tokens.first() != Some(&TAG) || tokens.get(1) != Some(&NS_HEALTH) {
            continue;
        }
        match parse_check(&tokens, value, interval, &container, &formatter) {
            Ok(spec) => checks.push(spec),
            Err(e) => {
                tracing::warn!(label = %key, error = %e, "skipping malformed health label");
            }
        }
    }

    let formatter = Arc::try_unwrap(formatter).unwrap_or_else(|arc| (*arc).clone());
    (checks, formatter)
}

fn parse_check(
    tokens: &[&str],
    value: &str,
    interval: Duration,
    container: &ContainerIdentity,
    formatter: &Arc<Formatter>,
) -> Result<CheckSpec, ParseError> {
    if tokens.len() < 3 {
        return Err(ParseError::PathTooShort(tokens.join(".")));
    }
    if value.trim().is_empty() {
        return Err(ParseError::EmptyValue(tokens.join(".")));
    }

    let (site, name_tokens): (ExecutionSite, &[&str]) = match tokens[2] {
        SITE_INTERNAL => (ExecutionSite::Internal, &tokens[3..]),
        SITE_EXTERNAL => (ExecutionSite::External, &tokens[3..]),
        _ => (ExecutionSite::Internal, &tokens[2..]),
    };
    if name_tokens.is_empty() {
        return Err(ParseError::PathTooShort(tokens.join(".")));
    }

    let separator = if formatter.platform.target == PlatformTarget::Statsd {
        "."
    } else {
        "_"
    };
    let name = name_tokens.join(separator);

    let command = shlex::split(value).unwrap_or_default();
    if command.is_empty() {
        return Err(ParseError::EmptyCommand(name));
    }

    Ok(CheckSpec {
        name,
        site,
        command,
        interval,
        container: container.clone(),
        formatter: Arc::clone(formatter),
    })
}

/// First pass: split `ogre.format.*` labels into the Output and Platform
/// sub-maps and build the shared [`Formatter`] plus the check interval.
fn parse_formatter(labels: &HashMap<String, String>) -> (Formatter, Duration) {
    let mut backend_kv: HashMap<String, String> = HashMap::new();
    let mut health_kv: HashMap<String, String> = HashMap::new();

    for (key, value) in labels {
        let tokens: Vec<&str> = key.split('.').collect();
        if tokens.first() != Some(&TAG) || tokens.get(1) != Some(&NS_FORMAT) {
            continue;
        }
        if tokens.len() < 4 || value.trim().is_empty() {
            continue;
        }
        let suffix = tokens[3..].join(".");
        match tokens[2] {
            "backend" => {
                backend_kv.insert(suffix, normalize(value));
            }
            "health" => {
                health_kv.insert(suffix, value.to_string());
            }
            _ => {}
        }
    }

    let output = OutputSpec {
        output_type: health_kv
            .get("output.type")
            .cloned()
            .unwrap_or_else(|| "int".to_string()),
        output_result: health_kv
            .get("output.result")
            .cloned()
            .unwrap_or_else(|| "exit".to_string()),
    };

    let target = if backend_kv.contains_key("statsd") {
        PlatformTarget::Statsd
    } else if backend_kv.contains_key("http") {
        PlatformTarget::Http
    } else if backend_kv
        .keys()
        .any(|k| k == "prometheus" || k.starts_with("prometheus."))
    {
        PlatformTarget::Prometheus
    } else if backend_kv.contains_key("collectd") {
        tracing::info!("ogre.format.backend.collectd is a reserved, unimplemented backend; falling back to default-log");
        PlatformTarget::DefaultLog
    } else {
        PlatformTarget::DefaultLog
    };

    let platform = PlatformSpec {
        target,
        prometheus_metric: backend_kv
            .get("prometheus.metric")
            .cloned()
            .unwrap_or_else(|| "ogre_metric".to_string()),
        prometheus_label: backend_kv
            .get("prometheus.label")
            .cloned()
            .unwrap_or_else(|| "ogre_job".to_string()),
    };

    let interval = match health_kv.get("interval") {
        Some(raw) => humantime::parse_duration(raw).unwrap_or_else(|_| {
            let reason = ParseError::BadDuration {
                key: "ogre.format.health.interval".to_string(),
                value: raw.clone(),
            };
            tracing::warn!(error = %reason, "defaulting to 5s");
            DEFAULT_INTERVAL
        }),
        None => DEFAULT_INTERVAL,
    };

    (Formatter { output, platform }, interval)
}

fn normalize(value: &str) -> String {
    value.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> ContainerIdentity {
        ContainerIdentity {
            id: "c1".to_string(),
            name: "web".to_string(),
            hostname: "host-a".to_string(),
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn single_default_check() {
        let (checks, formatter) =
            parse_labels(&labels(&[("ogre.health.foo.check", "./usr/bin/foo.sh")]), container());
        assert_eq!(checks.len(), 1);
        let check = &checks[0];
        assert_eq!(check.name, "foo_check");
        assert_eq!(check.command, vec!["./usr/bin/foo.sh"]);
        assert_eq!(check.site, ExecutionSite::Internal);
        assert_eq!(check.interval, Duration::from_secs(5));
        assert_eq!(formatter.platform.target, PlatformTarget::DefaultLog);
    }

    #[test]
    fn statsd_dotted_naming() {
        let (checks, formatter) = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "./usr/bin/foo.sh"),
                ("ogre.format.backend.statsd", "true"),
            ]),
            container(),
        );
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].name, "foo.check");
        assert_eq!(formatter.platform.target, PlatformTarget::Statsd);
    }

    #[test]
    fn prometheus_with_full_format() {
        let (checks, formatter) = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "./usr/bin/foo.sh"),
                ("ogre.format.backend.prometheus.metric", "foo_metric"),
                ("ogre.format.backend.prometheus.label", "foo_job"),
                ("ogre.format.health.output.type", "string"),
                ("ogre.format.health.output.result", "return"),
            ]),
            container(),
        );
        assert_eq!(checks.len(), 1);
        assert_eq!(formatter.output.output_type, "string");
        assert_eq!(formatter.output.output_result, "return");
        assert_eq!(formatter.platform.target, PlatformTarget::Prometheus);
        assert_eq!(formatter.platform.prometheus_metric, "foo_metric");
        assert_eq!(formatter.platform.prometheus_label, "foo_job");
    }

    #[test]
    fn external_execution_site() {
        let (checks, _) = parse_labels(
            &labels(&[("ogre.health.ex.foo.check", "./usr/bin/foo.sh")]),
            container(),
        );
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].site, ExecutionSite::External);
        assert_eq!(checks[0].name, "foo_check");
    }

    #[test]
    fn interval_absent_defaults_to_five_seconds() {
        let (checks, _) = parse_labels(
            &labels(&[("ogre.health.foo.check", "./usr/bin/foo.sh")]),
            container(),
        );
        assert_eq!(checks[0].interval, Duration::from_secs(5));
    }

    #[test]
    fn interval_unparseable_defaults_to_five_seconds() {
        let (checks, _) = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "./usr/bin/foo.sh"),
                ("ogre.format.health.interval", "not-a-duration"),
            ]),
            container(),
        );
        assert_eq!(checks[0].interval, Duration::from_secs(5));
    }

    #[test]
    fn interval_parses_humantime_suffix() {
        let (checks, _) = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "./usr/bin/foo.sh"),
                ("ogre.format.health.interval", "10s"),
            ]),
            container(),
        );
        assert_eq!(checks[0].interval, Duration::from_secs(10));
    }

    #[test]
    fn empty_value_is_skipped() {
        let (checks, _) = parse_labels(
            &labels(&[("ogre.health.foo.check", "")]),
            container(),
        );
        assert!(checks.is_empty());
    }

    #[test]
    fn unrelated_labels_are_ignored() {
        let (checks, _) = parse_labels(
            &labels(&[("com.example.other", "value"), ("ogre.health.foo", "true")]),
            container(),
        );
        assert_eq!(checks.len(), 1);
    }

    #[test]
    fn empty_label_map_produces_no_checks_and_no_error() {
        let (checks, formatter) = parse_labels(&HashMap::new(), container());
        assert!(checks.is_empty());
        assert_eq!(formatter, Formatter::default());
    }

    #[test]
    fn no_backend_label_defaults_to_default_log() {
        let (_, formatter) = parse_labels(
            &labels(&[("ogre.health.foo.check", "true")]),
            container(),
        );
        assert_eq!(formatter.platform.target, PlatformTarget::DefaultLog);
        assert_eq!(formatter.platform.prometheus_metric, "ogre_metric");
        assert_eq!(formatter.platform.prometheus_label, "ogre_job");
    }

    #[test]
    fn collectd_backend_falls_back_to_default_log() {
        let (_, formatter) = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "true"),
                ("ogre.format.backend.collectd", "true"),
            ]),
            container(),
        );
        assert_eq!(formatter.platform.target, PlatformTarget::DefaultLog);
    }

    #[test]
    fn space_in_backend_value_is_normalized() {
        let (_, formatter) = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "true"),
                ("ogre.format.backend.prometheus.metric", "foo metric name"),
            ]),
            container(),
        );
        assert_eq!(formatter.platform.prometheus_metric, "foo_metric_name");
    }

    #[test]
    fn name_determinism_for_fixed_labels() {
        let first = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "true"),
                ("ogre.format.backend.statsd", "true"),
            ]),
            container(),
        );
        let second = parse_labels(
            &labels(&[
                ("ogre.health.foo.check", "true"),
                ("ogre.format.backend.statsd", "true"),
            ]),
            container(),
        );
        assert_eq!(first.0[0].name, second.0[0].name);
    }

    proptest::proptest! {
        #[test]
        fn parser_is_total(pairs in proptest::collection::vec(
            (".{0,30}", ".{0,30}"), 0..20
        )) {
            let map: HashMap<String, String> = pairs.into_iter().collect();
            let (_checks, _formatter) = parse_labels(&map, container());
        }
    }
}
