use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use esg_materiality_catalog::{
    catalog_json, resource_text as catalog_resource_text, to_topics, CATALOG_ID, CATALOG_MIME_TYPE,
    CATALOG_URI,
};
use esg_materiality_core::{
    build_catalog, classify_topic, priority_groups, quadrant_buckets, resolve_ratings,
    topic_color, unknown_rating_ids, unrated_topic_ids, AssessmentState, BusinessImpactAssessment,
    Category, Framework, IndustryContext, InputPolicy, Quadrant, RatingDraft, RatingMap,
    RawPriority, Topic,
    DEFAULT_BUSINESS_IMPACT,
};
use esg_materiality_storage::{JsonFileStore, MemoryStore, StorageBackend, StorageError};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BackendKind, ConfigError, ServerConfig};
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, METHOD_NOT_FOUND, SERVER_ERROR,
};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const UNKNOWN_TOOL_LABEL: &str = "unknown";
const TOOL_NAMES: [&str; 7] = [
    "materiality_catalog",
    "materiality_derive_impact",
    "materiality_classify",
    "materiality_matrix",
    "materiality_export",
    "assessment_load",
    "assessment_clear",
];

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct McpServer {
    store: Arc<Mutex<Box<dyn StorageBackend>>>,
    config: ServerConfig,
    catalog: Vec<Topic>,
    metrics: Arc<Mutex<MetricsRegistry>>,
}

#[derive(Debug, Default, Clone)]
struct ToolMetric {
    ok: u64,
    err: u64,
    total_latency_ms: f64,
    max_latency_ms: f64,
}

#[derive(Debug, Default, Clone)]
struct MetricsRegistry {
    tool: HashMap<String, ToolMetric>,
}

impl McpServer {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::with_config(ServerConfig::from_env()?)
    }

    pub fn with_config(config: ServerConfig) -> Result<Self, ServerError> {
        let store: Box<dyn StorageBackend> = match config.backend {
            BackendKind::Json => Box::new(JsonFileStore::open(&config.db_path)?),
            BackendKind::Memory => Box::new(MemoryStore::new()),
        };
        info!(
            backend = config.backend.as_str(),
            storage_key = %config.storage_key,
            input_policy = config.input_policy.as_str(),
            "materiality server ready"
        );
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            config,
            catalog: to_topics(),
            metrics: Arc::new(Mutex::new(MetricsRegistry::default())),
        })
    }

    pub fn with_db_path(db_path: impl Into<String>) -> Result<Self, ServerError> {
        Self::with_config(ServerConfig {
            db_path: db_path.into(),
            ..ServerConfig::default()
        })
    }

    pub fn in_memory() -> Result<Self, ServerError> {
        Self::with_config(ServerConfig {
            backend: BackendKind::Memory,
            ..ServerConfig::default()
        })
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.is_notification();
        let id = request.id.clone().unwrap_or(Value::Null);

        if is_notification && request.method.starts_with("notifications/") {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {
                            "name": "esg-materiality-mcp",
                            "version": env!("CARGO_PKG_VERSION")
                        },
                        "capabilities": {
                            "tools": {"listChanged": false},
                            "resources": {"subscribe": false, "listChanged": false}
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params),
            "resources/list" => JsonRpcResponse::success(id, resources_list_result()),
            "resources/read" => handle_resources_read(id, request.params),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "method not found"),
        };

        if is_notification {
            debug!(method = %request.method, "dropping response to notification");
            return None;
        }
        Some(response)
    }

    fn record_tool_metrics(&self, tool: &str, latency_ms: f64, is_error: bool) {
        let mut locked = self.metrics.lock();
        let metric = locked.tool.entry(tool.to_string()).or_default();
        if is_error {
            metric.err = metric.err.saturating_add(1);
        } else {
            metric.ok = metric.ok.saturating_add(1);
        }
        metric.total_latency_ms += latency_ms;
        metric.max_latency_ms = metric.max_latency_ms.max(latency_ms);
    }

    pub(crate) fn render_metrics_text(&self) -> String {
        let mut lines = vec![
            "# TYPE esg_materiality_tool_calls_total counter".to_string(),
            "# TYPE esg_materiality_tool_latency_ms_sum counter".to_string(),
            "# TYPE esg_materiality_tool_latency_ms_max gauge".to_string(),
            "# TYPE esg_materiality_catalog_topics gauge".to_string(),
        ];

        let locked = self.metrics.lock();
        let mut tools = locked.tool.keys().cloned().collect::<Vec<_>>();
        tools.sort();
        for tool in tools {
            let Some(m) = locked.tool.get(&tool) else {
                continue;
            };
            let label = prom_label_value(&tool);
            lines.push(format!(
                "esg_materiality_tool_calls_total{{tool=\"{label}\",status=\"ok\"}} {}",
                m.ok
            ));
            lines.push(format!(
                "esg_materiality_tool_calls_total{{tool=\"{label}\",status=\"error\"}} {}",
                m.err
            ));
            lines.push(format!(
                "esg_materiality_tool_latency_ms_sum{{tool=\"{label}\"}} {:.3}",
                m.total_latency_ms
            ));
            lines.push(format!(
                "esg_materiality_tool_latency_ms_max{{tool=\"{label}\"}} {:.3}",
                m.max_latency_ms
            ));
        }
        lines.push(format!(
            "esg_materiality_catalog_topics {}",
            self.catalog.len()
        ));
        lines.join("\n") + "\n"
    }

    pub(crate) fn render_metrics_summary(&self) -> Value {
        let locked = self.metrics.lock();
        let (total_calls, total_errors) = locked
            .tool
            .values()
            .fold((0_u64, 0_u64), |acc, m| (acc.0 + m.ok + m.err, acc.1 + m.err));
        let tool_error_ratio = if total_calls == 0 {
            0.0
        } else {
            total_errors as f64 / total_calls as f64
        };
        let mut per_tool = BTreeMap::new();
        for (tool, m) in &locked.tool {
            per_tool.insert(
                tool.clone(),
                json!({"ok": m.ok, "error": m.err, "max_latency_ms": m.max_latency_ms}),
            );
        }

        json!({
            "status": "ok",
            "total_calls": total_calls,
            "total_errors": total_errors,
            "tool_error_ratio": tool_error_ratio,
            "tools": per_tool
        })
    }

    pub(crate) fn health(&self) -> Value {
        let (storage, keys) = {
            let locked = self.store.lock();
            (locked.stats(), locked.keys())
        };
        json!({
            "status": "ok",
            "catalog_size": self.catalog.len(),
            "input_policy": self.config.input_policy.as_str(),
            "storage_key": self.config.storage_key,
            "saved_assessment": keys.contains(&self.config.storage_key),
            "storage": storage
        })
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::invalid_params(id, format!("invalid params: {err}"));
            }
        };

        let start = Instant::now();
        let tool = metric_tool_label(&parsed.name);
        let response = match parsed.name.as_str() {
            "materiality_catalog" => self.exec_catalog(id, parsed.arguments),
            "materiality_derive_impact" => self.exec_derive_impact(id, parsed.arguments),
            "materiality_classify" => self.exec_classify(id, parsed.arguments),
            "materiality_matrix" => self.exec_matrix(id, parsed.arguments),
            "materiality_export" => self.exec_export(id, parsed.arguments),
            "assessment_load" => self.exec_assessment_load(id),
            "assessment_clear" => self.exec_assessment_clear(id),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "unknown tool"),
        };
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let is_error = response.error.is_some();
        debug!(tool = %parsed.name, latency_ms, is_error, "tool call");
        self.record_tool_metrics(tool, latency_ms, is_error);
        response
    }

    /// Catalog for a call: the built-in topics plus any caller-supplied
    /// custom topics appended after them.
    fn catalog_for(&self, custom: Vec<CustomTopicInput>) -> Result<Vec<Topic>, String> {
        if custom.is_empty() {
            return Ok(self.catalog.clone());
        }
        let extra = custom.into_iter().map(CustomTopicInput::into_topic).collect();
        build_catalog(self.catalog.clone(), extra).map_err(|err| err.to_string())
    }

    fn policy_for(&self, raw: Option<&str>) -> Result<InputPolicy, String> {
        match raw {
            Some(raw) => raw.parse::<InputPolicy>().map_err(|err| err.to_string()),
            None => Ok(self.config.input_policy),
        }
    }

    /// Resolves only the drafts that name a catalog topic; the rest are
    /// reported back untouched.
    fn prepare(&self, input: RatingsInput) -> Result<PreparedRatings, String> {
        let policy = self.policy_for(input.input_policy.as_deref())?;
        let catalog = self.catalog_for(input.custom_topics)?;
        let unknown_topic_ids = unknown_rating_ids(&catalog, &input.ratings)
            .into_iter()
            .map(str::to_string)
            .collect();
        let ratings =
            resolve_ratings(&catalog, &input.ratings, policy).map_err(|err| err.to_string())?;
        Ok(PreparedRatings {
            catalog,
            ratings,
            policy,
            unknown_topic_ids,
        })
    }

    fn exec_catalog(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CatalogInput = match parse_args_optional(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let catalog = match self.catalog_for(args.custom_topics) {
            Ok(v) => v,
            Err(msg) => return JsonRpcResponse::invalid_params(id, msg),
        };

        let mut structured = catalog_json(&catalog);
        if !args.include_colors.unwrap_or(true) {
            if let Some(topics) = structured.get_mut("topics").and_then(Value::as_array_mut) {
                for topic in topics {
                    if let Some(obj) = topic.as_object_mut() {
                        obj.remove("color");
                    }
                }
            }
        }

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": structured,
                "content": [{"type": "text", "text": format!("catalog has {} topics", catalog.len())}]
            }),
        )
    }

    fn exec_classify(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: RatingsInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let prepared = match self.prepare(args) {
            Ok(v) => v,
            Err(msg) => return JsonRpcResponse::invalid_params(id, msg),
        };
        let PreparedRatings {
            catalog,
            ratings,
            policy,
            unknown_topic_ids,
        } = &prepared;

        let topics = catalog
            .iter()
            .enumerate()
            .filter_map(|(index, topic)| {
                let rating = ratings.get(&topic.id)?;
                let classified = classify_topic(&topic.id, rating);
                Some(json!({
                    "topic_id": classified.topic_id,
                    "name": topic.name,
                    "category": topic.category,
                    "framework": topic.framework,
                    "stakeholder_importance": rating.stakeholder_importance,
                    "business_impact": rating.business_impact,
                    "normalized_x": classified.normalized_x,
                    "normalized_y": classified.normalized_y,
                    "quadrant": classified.quadrant,
                    "quadrant_label": classified.quadrant.label(),
                    "raw_priority": rating.raw_priority(),
                    "raw_priority_label": rating.raw_priority().map(RawPriority::label),
                    "material": rating.is_material(),
                    "color": topic_color(index, catalog.len())
                }))
            })
            .collect::<Vec<_>>();

        let unrated = unrated_topic_ids(catalog, ratings);

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "input_policy": policy,
                    "catalog_size": catalog.len(),
                    "count": topics.len(),
                    "topics": topics,
                    "unrated": unrated,
                    "unknown_topic_ids": unknown_topic_ids
                },
                "content": [{
                    "type": "text",
                    "text": format!("classified {} topics ({} unrated)", topics.len(), unrated.len())
                }]
            }),
        )
    }

    fn exec_matrix(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: RatingsInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let prepared = match self.prepare(args) {
            Ok(v) => v,
            Err(msg) => return JsonRpcResponse::invalid_params(id, msg),
        };

        let buckets = quadrant_buckets(&prepared.catalog, &prepared.ratings);
        let groups = priority_groups(&prepared.catalog, &prepared.ratings);
        let mut counts = serde_json::Map::new();
        for quadrant in Quadrant::ALL {
            counts.insert(
                quadrant.as_str().to_string(),
                json!(buckets.bucket(quadrant).len()),
            );
        }

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "input_policy": prepared.policy,
                    "quadrants": buckets,
                    "quadrant_counts": counts,
                    "priority_groups": groups,
                    "unknown_topic_ids": prepared.unknown_topic_ids
                },
                "content": [{
                    "type": "text",
                    "text": format!(
                        "matrix high={} monitor={} consider={}",
                        groups.high_priority.len(),
                        groups.monitor.len(),
                        groups.consider.len()
                    )
                }]
            }),
        )
    }

    fn exec_export(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ExportInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let persist = args.persist.unwrap_or(true);
        let industry_context = args.industry_context.unwrap_or_default();
        let drafts = args.scope.ratings.clone();
        let prepared = match self.prepare(args.scope) {
            Ok(v) => v,
            Err(msg) => return JsonRpcResponse::invalid_params(id, msg),
        };

        let state = AssessmentState {
            industry_context,
            ratings: drafts,
        };
        let persisted = match state.to_persisted(&prepared.catalog, prepared.policy, now_ms()) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::invalid_params(id, err.to_string()),
        };

        if persist {
            let mut locked = self.store.lock();
            if let Err(err) = locked.save(&self.config.storage_key, &persisted) {
                return JsonRpcResponse::error(id, SERVER_ERROR, format!("storage error: {err}"));
            }
        }

        let count = persisted.material_topics.len();
        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "storage_key": self.config.storage_key,
                    "persisted": persist,
                    "unknown_topic_ids": prepared.unknown_topic_ids,
                    "material_topics": persisted.material_topics,
                    "assessment": persisted
                },
                "content": [{
                    "type": "text",
                    "text": format!("exported {count} material topics")
                }]
            }),
        )
    }

    fn exec_assessment_load(&self, id: Value) -> JsonRpcResponse {
        let loaded = self.store.lock().load(&self.config.storage_key);
        let assessment = match loaded {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(id, SERVER_ERROR, format!("storage error: {err}"))
            }
        };
        let found = assessment.is_some();
        let text = if found {
            "assessment loaded"
        } else {
            "no saved assessment"
        };
        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "storage_key": self.config.storage_key,
                    "found": found,
                    "assessment": assessment
                },
                "content": [{
                    "type": "text",
                    "text": text
                }]
            }),
        )
    }

    fn exec_assessment_clear(&self, id: Value) -> JsonRpcResponse {
        let cleared = match self.store.lock().clear(&self.config.storage_key) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(id, SERVER_ERROR, format!("storage error: {err}"))
            }
        };
        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "storage_key": self.config.storage_key,
                    "cleared": cleared
                },
                "content": [{"type": "text", "text": format!("cleared={cleared}")}]
            }),
        )
    }

    fn exec_derive_impact(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: DeriveImpactInput = match parse_args_optional(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let policy = match self.policy_for(args.input_policy.as_deref()) {
            Ok(v) => v,
            Err(msg) => return JsonRpcResponse::invalid_params(id, msg),
        };
        let topic_id = args.topic_id.as_deref().unwrap_or("impact-assessment");
        let business_impact = match args.assessment.resolve(topic_id, policy) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::invalid_params(id, err.to_string()),
        };
        let assessment = args.assessment;
        let used = [
            assessment.financial,
            assessment.operational,
            assessment.reputation,
            assessment.strategic,
        ]
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .count();

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "input_policy": policy,
                    "business_impact": business_impact,
                    "sub_scores_used": used,
                    "defaulted": used == 0,
                    "default_value": DEFAULT_BUSINESS_IMPACT
                },
                "content": [{"type": "text", "text": format!("business_impact={business_impact}")}]
            }),
        )
    }
}

/// Client-supplied tool names only become metric labels when they name a
/// served tool.
fn metric_tool_label(name: &str) -> &'static str {
    TOOL_NAMES
        .iter()
        .copied()
        .find(|tool| *tool == name)
        .unwrap_or(UNKNOWN_TOOL_LABEL)
}

fn tools_list_result() -> Value {
    let ratings_schema = json!({
        "type": "object",
        "description": "Map of topic id to rating draft.",
        "additionalProperties": {
            "type": "object",
            "properties": {
                "stakeholderImportance": {"type": "number", "minimum": 1, "maximum": 5},
                "businessImpact": {"type": "number", "minimum": 0, "maximum": 10},
                "impactAssessment": {
                    "type": "object",
                    "properties": {
                        "financial": {"type": "number"},
                        "operational": {"type": "number"},
                        "reputation": {"type": "number"},
                        "strategic": {"type": "number"}
                    }
                }
            }
        }
    });
    let custom_topics_schema = json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["id", "name", "category"],
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "category": {"type": "string", "enum": ["Environmental", "Social", "Governance"]},
                "framework": {"type": "string", "enum": ["SASB", "GRI", "TCFD", "Custom"]}
            }
        }
    });
    let policy_schema = json!({"type": "string", "enum": ["reject", "clamp", "permissive"]});

    json!({
        "tools": [
            {
                "name": "materiality_catalog",
                "description": "List the topic catalog with deterministic matrix colors.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "include_colors": {"type": "boolean"},
                        "custom_topics": custom_topics_schema
                    }
                }
            },
            {
                "name": "materiality_derive_impact",
                "description": "Derive business impact as the mean of the supplied sub-scores (5 when none).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "financial": {"type": "number", "minimum": 0, "maximum": 10},
                        "operational": {"type": "number", "minimum": 0, "maximum": 10},
                        "reputation": {"type": "number", "minimum": 0, "maximum": 10},
                        "strategic": {"type": "number", "minimum": 0, "maximum": 10},
                        "topic_id": {"type": "string"},
                        "input_policy": {"type": "string", "enum": ["reject", "clamp", "permissive"]}
                    }
                }
            },
            {
                "name": "materiality_classify",
                "description": "Normalize and classify every rated topic; unrated topics are listed separately.",
                "inputSchema": {
                    "type": "object",
                    "required": ["ratings"],
                    "properties": {
                        "ratings": ratings_schema,
                        "custom_topics": custom_topics_schema,
                        "input_policy": policy_schema
                    }
                }
            },
            {
                "name": "materiality_matrix",
                "description": "Group rated topics into matrix quadrants and final priority groups.",
                "inputSchema": {
                    "type": "object",
                    "required": ["ratings"],
                    "properties": {
                        "ratings": ratings_schema,
                        "custom_topics": custom_topics_schema,
                        "input_policy": policy_schema
                    }
                }
            },
            {
                "name": "materiality_export",
                "description": "Export material topics for strategy seeding and save the assessment blob.",
                "inputSchema": {
                    "type": "object",
                    "required": ["ratings"],
                    "properties": {
                        "ratings": ratings_schema,
                        "custom_topics": custom_topics_schema,
                        "input_policy": policy_schema,
                        "industry_context": {
                            "type": "object",
                            "properties": {
                                "industry": {"type": "string"},
                                "subIndustry": {"type": "string"},
                                "regions": {"type": "array", "items": {"type": "string"}},
                                "companySize": {"type": "string"}
                            }
                        },
                        "persist": {"type": "boolean"}
                    }
                }
            },
            {
                "name": "assessment_load",
                "description": "Load the saved assessment blob.",
                "inputSchema": {"type": "object", "properties": {}}
            },
            {
                "name": "assessment_clear",
                "description": "Delete the saved assessment blob.",
                "inputSchema": {"type": "object", "properties": {}}
            }
        ]
    })
}

fn resources_list_result() -> Value {
    json!({
        "resources": [{
            "uri": CATALOG_URI,
            "name": CATALOG_ID,
            "description": "Built-in ESG topic catalog with matrix colors.",
            "mimeType": CATALOG_MIME_TYPE
        }]
    })
}

fn handle_resources_read(id: Value, params: Value) -> JsonRpcResponse {
    let parsed: ResourceReadParams = match serde_json::from_value(params) {
        Ok(v) => v,
        Err(err) => {
            return JsonRpcResponse::invalid_params(id, format!("invalid params: {err}"));
        }
    };
    let Some(text) = catalog_resource_text(&parsed.uri) else {
        return JsonRpcResponse::invalid_params(id, "unknown resource uri");
    };

    JsonRpcResponse::success(
        id,
        json!({
            "contents": [{
                "uri": parsed.uri,
                "mimeType": CATALOG_MIME_TYPE,
                "text": text
            }]
        }),
    )
}

fn with_id(mut response: JsonRpcResponse, id: Value) -> JsonRpcResponse {
    response.id = id;
    response
}

fn prom_label_value(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', " ")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    let Some(args) = arguments else {
        return Err(JsonRpcResponse::invalid_params(
            Value::Null,
            "missing tool arguments",
        ));
    };

    serde_json::from_value(args).map_err(|err| {
        JsonRpcResponse::invalid_params(Value::Null, format!("invalid tool arguments: {err}"))
    })
}

fn parse_args_optional<T: for<'de> Deserialize<'de> + Default>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    match arguments {
        Some(v) => serde_json::from_value(v).map_err(|err| {
            JsonRpcResponse::invalid_params(Value::Null, format!("invalid tool arguments: {err}"))
        }),
        None => Ok(T::default()),
    }
}

struct PreparedRatings {
    catalog: Vec<Topic>,
    ratings: RatingMap,
    policy: InputPolicy,
    unknown_topic_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct CustomTopicInput {
    id: String,
    name: String,
    category: Category,
    framework: Option<Framework>,
}

impl CustomTopicInput {
    fn into_topic(self) -> Topic {
        Topic::new(
            self.id.trim(),
            self.name,
            self.category,
            self.framework.unwrap_or(Framework::Custom),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogInput {
    include_colors: Option<bool>,
    #[serde(default)]
    custom_topics: Vec<CustomTopicInput>,
}

#[derive(Debug, Deserialize)]
struct RatingsInput {
    ratings: BTreeMap<String, RatingDraft>,
    #[serde(default)]
    custom_topics: Vec<CustomTopicInput>,
    input_policy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeriveImpactInput {
    #[serde(flatten)]
    assessment: BusinessImpactAssessment,
    topic_id: Option<String>,
    input_policy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportInput {
    #[serde(flatten)]
    scope: RatingsInput,
    industry_context: Option<IndustryContext>,
    persist: Option<bool>,
}
