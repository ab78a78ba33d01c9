//! Declarative tool catalogs.
//!
//! Each catalog is a function returning [`ToolSpec`]s; none of them holds
//! execution logic. The `health` tool is always registered.

mod ccb;
mod code_search;
mod debug;
mod docker;
mod firewall;
mod git;
mod gitee;
mod http;
mod openssl;
mod pci;
mod rpm;
mod sysctl;
mod usb;

use std::collections::BTreeSet;

use crate::adapter::{Builtin, ToolSpec};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown catalog '{name}' (available: {available})")]
    Unknown { name: String, available: String },
}

struct Catalog {
    name: &'static str,
    tools: fn() -> Vec<ToolSpec>,
}

const CATALOGS: &[Catalog] = &[
    Catalog { name: "ccb", tools: ccb::tools },
    Catalog { name: "code_search", tools: code_search::tools },
    Catalog { name: "debug", tools: debug::tools },
    Catalog { name: "docker", tools: docker::tools },
    Catalog { name: "firewall", tools: firewall::tools },
    Catalog { name: "git", tools: git::tools },
    Catalog { name: "gitee", tools: gitee::tools },
    Catalog { name: "http", tools: http::tools },
    Catalog { name: "openssl", tools: openssl::tools },
    Catalog { name: "pci", tools: pci::tools },
    Catalog { name: "rpm", tools: rpm::tools },
    Catalog { name: "sysctl", tools: sysctl::tools },
    Catalog { name: "usb", tools: usb::tools },
];

/// Names of every available catalog.
pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOGS.iter().map(|c| c.name)
}

/// Specs for the named catalogs (all of them for `None`), plus `health`.
/// Repeated names are taken once.
pub fn select(names: Option<&[String]>) -> Result<Vec<ToolSpec>, CatalogError> {
    let mut specs = vec![ToolSpec::builtin(
        "health",
        "Report that the server is running",
        Builtin::Health,
    )];

    let chosen: Vec<&Catalog> = match names {
        None => CATALOGS.iter().collect(),
        Some(names) => {
            let mut seen = BTreeSet::new();
            let mut chosen = Vec::new();
            for name in names {
                let catalog = CATALOGS.iter().find(|c| c.name == name).ok_or_else(|| {
                    CatalogError::Unknown {
                        name: name.clone(),
                        available: self::names().collect::<Vec<_>>().join(", "),
                    }
                })?;
                if seen.insert(catalog.name) {
                    chosen.push(catalog);
                }
            }
            chosen
        }
    };

    for catalog in chosen {
        specs.extend((catalog.tools)());
    }
    Ok(specs)
}
