// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribution tags for issued credentials.
//!
//! Tags are computed by evaluating a JMESPath expression over two bindings, `run`
//! (the workflow run document) and `job` (the authenticated job's entry in
//! the jobs document). The expression must yield a flat object of strings;
//! anything else fails the whole computation, so a credential is never
//! issued with a partial tag set.

pub mod error;

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::instrument;

pub use error::TagError;

pub type Tags = BTreeMap<String, String>;

pub const DEFAULT_TAGS_EXPRESSION: &str = r#"{
	"github:jobId":  to_string(job.id),
	"github:runId":  to_string(run.id),
	"github:run":    to_string(run.run_number),
	"github:job":    job.name,
	"github:commit": run.head_commit.id,
	"github:repo":   run.repository.full_name,
	"github:author": run.head_commit.author.email
}"#;

/// Evaluates an expression against a bindings document.
pub trait TagEvaluator: Send + Sync {
	fn evaluate(&self, bindings: &Value) -> Result<Value, TagError>;
}

/// A validated JMESPath tag expression. Parse once at startup so a bad
/// override is reported before the first request.
///
/// Compiled `jmespath` expressions are not `Send`, so only the source is
/// kept and each evaluation compiles it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExpression {
	source: String,
}

impl TagExpression {
	pub fn parse(source: &str) -> Result<Self, TagError> {
		compile(source)?;
		Ok(Self {
			source: source.to_string(),
		})
	}

	pub fn source(&self) -> &str {
		&self.source
	}
}

impl Default for TagExpression {
	fn default() -> Self {
		Self {
			source: DEFAULT_TAGS_EXPRESSION.to_string(),
		}
	}
}

fn compile(source: &str) -> Result<jmespath::Expression<'static>, TagError> {
	jmespath::compile(source).map_err(|e| TagError::Expression(e.to_string()))
}

impl TagEvaluator for TagExpression {
	fn evaluate(&self, bindings: &Value) -> Result<Value, TagError> {
		let expr = compile(&self.source)?;
		let result = expr
			.search(bindings)
			.map_err(|e| TagError::Evaluation(e.to_string()))?;
		serde_json::to_value(&*result).map_err(|e| TagError::Evaluation(e.to_string()))
	}
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

/// Computes tags for the job at `job_index` in `jobs_raw["jobs"]`.
#[instrument(skip_all, fields(job_index = job_index))]
pub fn compute_tags(
	evaluator: &dyn TagEvaluator,
	jobs_raw: &Value,
	run_raw: &Value,
	job_index: usize,
) -> Result<Tags, TagError> {
	let jobs = jobs_raw
		.get("jobs")
		.and_then(Value::as_array)
		.map(Vec::as_slice)
		.unwrap_or_default();
	let job = jobs
		.get(job_index)
		.ok_or(TagError::JobIndexOutOfRange {
			index: job_index,
			len: jobs.len(),
		})?;

	let bindings = json!({ "run": run_raw, "job": job });
	let result = evaluator.evaluate(&bindings)?;

	let map = match result {
		Value::Object(map) => map,
		other => return Err(TagError::NotAnObject(type_name(&other))),
	};

	map.into_iter()
		.map(|(key, value)| match value {
			Value::String(s) => Ok((key, s)),
			other => Err(TagError::NonStringTagValue {
				key,
				found: type_name(&other),
			}),
		})
		.collect()
}
