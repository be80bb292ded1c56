//! Code signing settings for the extension's build configurations.

use crate::constants::{PREF_DEVELOPMENT_TEAM, PREF_PROVISIONING_PROFILE};
use crate::pbx::ProjectGraph;
use crate::prefs::{self, ConfigXml, Overrides};

/// Provisioning profile and team applied to the extension target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    pub provisioning_profile: String,
    pub development_team: String,
}

impl SigningIdentity {
    /// Both parts are required; with either one missing there is no identity.
    pub fn from_parts(
        provisioning_profile: Option<String>,
        development_team: Option<String>,
    ) -> Option<Self> {
        match (provisioning_profile, development_team) {
            (Some(provisioning_profile), Some(development_team))
                if !provisioning_profile.is_empty() && !development_team.is_empty() =>
            {
                Some(Self {
                    provisioning_profile,
                    development_team,
                })
            }
            _ => None,
        }
    }

    /// `SHAREEXT_PROVISIONING_PROFILE` and `SHAREEXT_DEVELOPMENT_TEAM`,
    /// from overrides first, then `config.xml`.
    pub fn resolve(config: &ConfigXml, overrides: &Overrides) -> Option<Self> {
        Self::from_parts(
            prefs::parameter(PREF_PROVISIONING_PROFILE, config, overrides),
            prefs::parameter(PREF_DEVELOPMENT_TEAM, config, overrides),
        )
    }
}

/// Set `PROVISIONING_PROFILE` and `DEVELOPMENT_TEAM` on every build
/// configuration whose `PRODUCT_NAME` contains `marker`.
///
/// This is a substring heuristic: any configuration with a matching product
/// name is affected. Without an identity nothing changes. Returns the number
/// of configurations updated.
pub fn configure_signing(
    graph: &mut ProjectGraph,
    identity: Option<&SigningIdentity>,
    marker: &str,
) -> usize {
    let Some(identity) = identity else {
        log::debug!("No signing identity configured, build settings untouched");
        return 0;
    };

    let mut updated = 0;
    for (id, config) in graph.build_configurations_mut() {
        let matches = config
            .setting("PRODUCT_NAME")
            .is_some_and(|name| name.contains(marker));
        if !matches {
            continue;
        }

        config.set_setting("PROVISIONING_PROFILE", identity.provisioning_profile.as_str());
        config.set_setting("DEVELOPMENT_TEAM", identity.development_team.as_str());
        log::debug!("Signing settings applied to configuration {id}");
        updated += 1;
    }

    log::info!(
        "Adding team {} and provisioning profile {} to {updated} configurations",
        identity.development_team,
        identity.provisioning_profile
    );
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbx::graph::tests::fixture;

    fn identity() -> SigningIdentity {
        SigningIdentity {
            provisioning_profile: "0000-PROFILE".into(),
            development_team: "TEAM123".into(),
        }
    }

    #[test]
    fn test_identity_requires_both_parts() {
        assert!(SigningIdentity::from_parts(Some("p".into()), None).is_none());
        assert!(SigningIdentity::from_parts(None, Some("t".into())).is_none());
        assert!(SigningIdentity::from_parts(Some("p".into()), Some(String::new())).is_none());
        assert!(SigningIdentity::from_parts(Some("p".into()), Some("t".into())).is_some());
    }

    #[test]
    fn test_resolve_prefers_overrides() {
        let config = ConfigXml::from_text(
            r#"<widget>
    <preference name="SHAREEXT_PROVISIONING_PROFILE" value="from-config" />
    <preference name="SHAREEXT_DEVELOPMENT_TEAM" value="CONFIGTEAM" />
</widget>"#,
        );
        let overrides = Overrides::new().with(PREF_DEVELOPMENT_TEAM, "ARGTEAM");

        let identity = SigningIdentity::resolve(&config, &overrides).unwrap();
        assert_eq!(identity.provisioning_profile, "from-config");
        assert_eq!(identity.development_team, "ARGTEAM");
    }

    #[test]
    fn test_only_marked_configurations_are_signed() {
        let mut graph = fixture();
        let target = graph.ensure_target("ShareExt");
        assert!(target.created);
        let untouched: Vec<_> = graph
            .build_configurations()
            .filter(|(_, c)| c.setting("PRODUCT_NAME") != Some("ShareExt"))
            .map(|(id, c)| (id.clone(), c.clone()))
            .collect();

        let updated = configure_signing(&mut graph, Some(&identity()), "ShareExt");
        assert_eq!(updated, 2);

        for (_, config) in graph.build_configurations() {
            if config.setting("PRODUCT_NAME") == Some("ShareExt") {
                assert_eq!(config.setting("DEVELOPMENT_TEAM"), Some("TEAM123"));
                assert_eq!(config.setting("PROVISIONING_PROFILE"), Some("0000-PROFILE"));
            }
        }
        for (id, before) in untouched {
            let Some(crate::pbx::Node::BuildConfiguration(after)) = graph.get(&id) else {
                panic!("configuration {id} disappeared");
            };
            assert_eq!(after, &before);
        }
    }

    #[test]
    fn test_without_identity_nothing_changes() {
        let mut graph = fixture();
        graph.ensure_target("ShareExt");
        let before = graph.clone();

        assert_eq!(configure_signing(&mut graph, None, "ShareExt"), 0);
        assert_eq!(graph, before);
    }
}
