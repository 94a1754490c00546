//! CEL inclusion predicate.

use anyhow::Result;
use cel::{Context, Program, Value};
use std::sync::Arc;

use crate::primitive::{PrimitiveKind, Tags};

/// A compiled CEL expression deciding whether a primitive is written.
///
/// The expression sees two variables: `kind` (`"node"`, `"way"` or
/// `"relation"`) and `tags`, a map of the primitive's tags.
#[derive(Clone)]
pub struct InclusionPredicate {
    program: Arc<Program>,
    source: String,
}

impl std::fmt::Debug for InclusionPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InclusionPredicate")
            .field("source", &self.source)
            .finish()
    }
}

impl InclusionPredicate {
    pub fn compile(source: &str) -> Result<Self> {
        let program = Program::compile(source)
            .map_err(|e| anyhow::anyhow!("CEL compile error in {:?}: {}", source, e))?;

        Ok(Self {
            program: Arc::new(program),
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn evaluate(&self, kind: PrimitiveKind, tags: &Tags) -> Result<Value> {
        let mut ctx = Context::default();
        ctx.add_variable("kind", kind.as_str().to_string())
            .map_err(|e| anyhow::anyhow!("CEL context error: {}", e))?;
        ctx.add_variable("tags", tags.to_map())
            .map_err(|e| anyhow::anyhow!("CEL context error: {}", e))?;

        self.program
            .execute(&ctx)
            .map_err(|e| anyhow::anyhow!("CEL execution error: {}", e))
    }

    /// Only a boolean `true` accepts; anything else rejects.
    pub fn accepts(&self, kind: PrimitiveKind, tags: &Tags) -> bool {
        match self.evaluate(kind, tags) {
            Ok(Value::Bool(accepted)) => accepted,
            Ok(other) => {
                tracing::debug!(
                    "Inclusion expression {:?} returned non-boolean {:?}",
                    self.source,
                    other
                );
                false
            }
            Err(e) => {
                tracing::debug!("Inclusion expression {:?} failed: {}", self.source, e);
                false
            }
        }
    }
}
