//! Default lifecycle plugin bindings.
//!
//! When plugin processing is requested, each packaging contributes a
//! standard plugin set so an effective model always names the plugins its
//! lifecycle runs, even if the descriptor never mentions them.

use crate::model::{Model, Plugin};
use crate::problem::ProblemCollector;

pub trait LifecycleBindingsInjector: Send + Sync {
    fn inject_lifecycle_bindings(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLifecycleBindingsInjector;

const STANDARD_PLUGIN_GROUP: &str = "org.pommel.plugins";

fn bindings_for(packaging: &str) -> &'static [(&'static str, &'static str)] {
    match packaging {
        "pom" => &[
            ("pommel-clean-plugin", "3.2.0"),
            ("pommel-install-plugin", "3.1.1"),
            ("pommel-deploy-plugin", "3.1.1"),
            ("pommel-site-plugin", "4.0.0"),
        ],
        _ => &[
            ("pommel-clean-plugin", "3.2.0"),
            ("pommel-resources-plugin", "3.3.1"),
            ("pommel-compiler-plugin", "3.11.0"),
            ("pommel-surefire-plugin", "3.1.2"),
            ("pommel-jar-plugin", "3.3.0"),
            ("pommel-install-plugin", "3.1.1"),
            ("pommel-deploy-plugin", "3.1.1"),
        ],
    }
}

impl LifecycleBindingsInjector for DefaultLifecycleBindingsInjector {
    fn inject_lifecycle_bindings(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        let packaging = model.packaging().to_string();
        let build = model.build.get_or_insert_with(Default::default);
        for (artifact_id, version) in bindings_for(&packaging) {
            let exists = build.plugins.iter().any(|p| {
                p.group_id.as_deref() == Some(STANDARD_PLUGIN_GROUP)
                    && p.artifact_id.as_deref() == Some(*artifact_id)
            });
            if !exists {
                build.plugins.push(Plugin {
                    group_id: Some(STANDARD_PLUGIN_GROUP.into()),
                    artifact_id: Some((*artifact_id).into()),
                    version: Some((*version).into()),
                    ..Default::default()
                });
            }
        }
    }
}
