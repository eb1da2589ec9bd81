//! Tier configuration catalogs.
//!
//! Each catalog is a closed enum with an exhaustive `profile()`/`image()`
//! match, so an unlisted entry is a compile-time gap rather than a runtime
//! lookup failure. Parsing from the declared string spec is where unknown
//! values surface, as a `CatalogError` that reconcilers treat as permanent.

use std::str::FromStr;

use thiserror::Error;

/// Port every backend workload listens on.
pub const BACKEND_PORT: u16 = 8080;

/// Port every frontend workload listens on.
pub const FRONTEND_PORT: u16 = 3000;

/// Unknown catalog key. The declared spec is invalid; not retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown database engine '{0}' (expected mysql, postgres, or mongo)")]
    UnknownEngine(String),

    #[error("unknown backend stack '{0}' (expected node, python, or php)")]
    UnknownStack(String),

    #[error("unknown frontend framework '{0}' (expected react, nextjs, or vue)")]
    UnknownFramework(String),
}

// ── Database engines ──────────────────────────────────────────────

/// Static configuration for one database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineProfile {
    pub image: &'static str,
    pub port: u16,
    /// Environment injected into the database container.
    pub env: &'static [(&'static str, &'static str)],
    /// Where the engine keeps its data; the storage claim mounts here.
    pub data_path: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Mysql,
    Postgres,
    Mongo,
}

impl DatabaseEngine {
    pub const ALL: [Self; 3] = [Self::Mysql, Self::Postgres, Self::Mongo];

    pub const fn profile(self) -> EngineProfile {
        match self {
            Self::Mysql => EngineProfile {
                image: "mysql:5.7",
                port: 3306,
                env: &[("MYSQL_ROOT_PASSWORD", "pass")],
                data_path: "/var/lib/mysql",
            },
            Self::Postgres => EngineProfile {
                image: "postgres:13",
                port: 5432,
                env: &[("POSTGRES_PASSWORD", "pass")],
                data_path: "/var/lib/postgresql/data",
            },
            Self::Mongo => EngineProfile {
                image: "mongo:4.4",
                port: 27017,
                env: &[],
                data_path: "/data/db",
            },
        }
    }
}

impl FromStr for DatabaseEngine {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Self::Mysql),
            "postgres" => Ok(Self::Postgres),
            "mongo" => Ok(Self::Mongo),
            other => Err(CatalogError::UnknownEngine(other.to_string())),
        }
    }
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Mongo => "mongo",
        };
        f.write_str(s)
    }
}

// ── Backend stacks ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStack {
    Node,
    Python,
    Php,
}

impl BackendStack {
    pub const ALL: [Self; 3] = [Self::Node, Self::Python, Self::Php];

    pub const fn image(self) -> &'static str {
        match self {
            Self::Node => "node:14-alpine",
            Self::Python => "python:3.9-slim",
            Self::Php => "php:7.4-apache",
        }
    }
}

impl FromStr for BackendStack {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "python" => Ok(Self::Python),
            "php" => Ok(Self::Php),
            other => Err(CatalogError::UnknownStack(other.to_string())),
        }
    }
}

impl std::fmt::Display for BackendStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Php => "php",
        };
        f.write_str(s)
    }
}

// ── Frontend frameworks ───────────────────────────────────────────

/// Declared frontend frameworks. They all run on a Node container; the
/// catalog still validates the declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendFramework {
    React,
    Nextjs,
    Vue,
}

impl FrontendFramework {
    pub const ALL: [Self; 3] = [Self::React, Self::Nextjs, Self::Vue];

    pub const fn image(self) -> &'static str {
        match self {
            Self::React | Self::Nextjs | Self::Vue => "node:16-alpine",
        }
    }
}

impl FromStr for FrontendFramework {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "react" => Ok(Self::React),
            "nextjs" => Ok(Self::Nextjs),
            "vue" => Ok(Self::Vue),
            other => Err(CatalogError::UnknownFramework(other.to_string())),
        }
    }
}

impl std::fmt::Display for FrontendFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::React => "react",
            Self::Nextjs => "nextjs",
            Self::Vue => "vue",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_has_image_and_port() {
        for engine in DatabaseEngine::ALL {
            let profile = engine.profile();
            assert!(!profile.image.is_empty());
            assert_ne!(profile.port, 0);
            assert!(!profile.data_path.is_empty());
        }
    }

    #[test]
    fn engine_table_matches_upstream_images() {
        assert_eq!(DatabaseEngine::Postgres.profile().image, "postgres:13");
        assert_eq!(DatabaseEngine::Postgres.profile().port, 5432);
        assert_eq!(DatabaseEngine::Mysql.profile().image, "mysql:5.7");
        assert_eq!(DatabaseEngine::Mysql.profile().port, 3306);
        assert_eq!(DatabaseEngine::Mongo.profile().image, "mongo:4.4");
        assert_eq!(DatabaseEngine::Mongo.profile().port, 27017);
    }

    #[test]
    fn mongo_needs_no_env() {
        assert!(DatabaseEngine::Mongo.profile().env.is_empty());
        assert_eq!(
            DatabaseEngine::Mysql.profile().env,
            &[("MYSQL_ROOT_PASSWORD", "pass")]
        );
    }

    #[test]
    fn parse_roundtrip() {
        for engine in DatabaseEngine::ALL {
            assert_eq!(engine.to_string().parse::<DatabaseEngine>(), Ok(engine));
        }
        for stack in BackendStack::ALL {
            assert_eq!(stack.to_string().parse::<BackendStack>(), Ok(stack));
        }
        for fw in FrontendFramework::ALL {
            assert_eq!(fw.to_string().parse::<FrontendFramework>(), Ok(fw));
        }
    }

    #[test]
    fn unknown_keys_are_typed_errors() {
        assert_eq!(
            "oracle".parse::<DatabaseEngine>(),
            Err(CatalogError::UnknownEngine("oracle".into()))
        );
        assert_eq!(
            "rust".parse::<BackendStack>(),
            Err(CatalogError::UnknownStack("rust".into()))
        );
        assert_eq!(
            "svelte".parse::<FrontendFramework>(),
            Err(CatalogError::UnknownFramework("svelte".into()))
        );
    }

    #[test]
    fn frameworks_share_the_node_image() {
        for fw in FrontendFramework::ALL {
            assert_eq!(fw.image(), "node:16-alpine");
        }
    }
}
