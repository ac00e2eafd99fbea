//! Declarations for a representative set of API operations.
//!
//! Every operation is plain data consumed by [`Endpoint`](crate::Endpoint);
//! adding one means adding a static here, not writing a new request type.

use crate::endpoint::{BodyRule, EndpointSpec, Segment};
use crate::params::{ParamKind, ParamSpec};
use http::Method;

use ParamKind::{Bool, Duration, Int, List, Str, Time};
use Segment::{Lit, Param};

/// `GET /`: basic cluster information.
pub static INFO: EndpointSpec = EndpointSpec {
    name: "info",
    method: Method::GET,
    path: &[],
    required: &[],
    body: BodyRule::None,
    params: &[],
};

/// `POST /{index}/_search`
pub static SEARCH: EndpointSpec = EndpointSpec {
    name: "search",
    method: Method::POST,
    path: &[Param("index"), Lit("_search")],
    required: &[],
    body: BodyRule::Optional,
    params: &[
        ParamSpec::new("_source", List),
        ParamSpec::new("_source_excludes", List),
        ParamSpec::new("_source_includes", List),
        ParamSpec::new("allow_no_indices", Bool),
        ParamSpec::new("analyzer", Str),
        ParamSpec::new("default_operator", Str),
        ParamSpec::new("expand_wildcards", Str),
        ParamSpec::new("from", Int),
        ParamSpec::new("ignore_unavailable", Bool),
        ParamSpec::new("preference", Str),
        ParamSpec::new("q", Str),
        ParamSpec::new("request_cache", Bool),
        ParamSpec::new("rest_total_hits_as_int", Bool),
        ParamSpec::new("routing", List),
        ParamSpec::new("scroll", Duration),
        ParamSpec::new("search_type", Str),
        ParamSpec::new("size", Int),
        ParamSpec::new("sort", List),
        ParamSpec::new("terminate_after", Int),
        ParamSpec::new("timeout", Duration),
        ParamSpec::new("track_total_hits", Str),
    ],
};

/// `POST /{index}/_doc/{id}`: index a document, with an optional id.
pub static INDEX: EndpointSpec = EndpointSpec {
    name: "index",
    method: Method::POST,
    path: &[Param("index"), Lit("_doc"), Param("id")],
    required: &["index"],
    body: BodyRule::Required,
    params: &[
        ParamSpec::new("if_primary_term", Int),
        ParamSpec::new("if_seq_no", Int),
        ParamSpec::new("op_type", Str),
        ParamSpec::new("pipeline", Str),
        ParamSpec::new("refresh", Str),
        ParamSpec::new("require_alias", Bool),
        ParamSpec::new("routing", Str),
        ParamSpec::new("timeout", Duration),
        ParamSpec::new("version", Int),
        ParamSpec::new("version_type", Str),
        ParamSpec::new("wait_for_active_shards", Str),
    ],
};

/// `GET /{index}/_doc/{id}`
pub static GET: EndpointSpec = EndpointSpec {
    name: "get",
    method: Method::GET,
    path: &[Param("index"), Lit("_doc"), Param("id")],
    required: &["index", "id"],
    body: BodyRule::None,
    params: &[
        ParamSpec::new("_source", List),
        ParamSpec::new("_source_excludes", List),
        ParamSpec::new("_source_includes", List),
        ParamSpec::new("preference", Str),
        ParamSpec::new("realtime", Bool),
        ParamSpec::new("refresh", Bool),
        ParamSpec::new("routing", Str),
        ParamSpec::new("stored_fields", List),
        ParamSpec::new("version", Int),
        ParamSpec::new("version_type", Str),
    ],
};

/// `DELETE /{index}/_doc/{id}`
pub static DELETE: EndpointSpec = EndpointSpec {
    name: "delete",
    method: Method::DELETE,
    path: &[Param("index"), Lit("_doc"), Param("id")],
    required: &["index", "id"],
    body: BodyRule::None,
    params: &[
        ParamSpec::new("if_primary_term", Int),
        ParamSpec::new("if_seq_no", Int),
        ParamSpec::new("refresh", Str),
        ParamSpec::new("routing", Str),
        ParamSpec::new("timeout", Duration),
        ParamSpec::new("version", Int),
        ParamSpec::new("version_type", Str),
        ParamSpec::new("wait_for_active_shards", Str),
    ],
};

/// `PUT /{index}`
pub static INDICES_CREATE: EndpointSpec = EndpointSpec {
    name: "indices.create",
    method: Method::PUT,
    path: &[Param("index")],
    required: &["index"],
    body: BodyRule::Optional,
    params: &[
        ParamSpec::new("master_timeout", Duration),
        ParamSpec::new("timeout", Duration),
        ParamSpec::new("wait_for_active_shards", Str),
    ],
};

/// `POST /{index}/_forcemerge`
pub static INDICES_FORCEMERGE: EndpointSpec = EndpointSpec {
    name: "indices.forcemerge",
    method: Method::POST,
    path: &[Param("index"), Lit("_forcemerge")],
    required: &[],
    body: BodyRule::None,
    params: &[
        ParamSpec::new("allow_no_indices", Bool),
        ParamSpec::new("expand_wildcards", Str),
        ParamSpec::new("flush", Bool),
        ParamSpec::new("ignore_unavailable", Bool),
        ParamSpec::new("max_num_segments", Int),
        ParamSpec::new("only_expunge_deletes", Bool),
        ParamSpec::new("wait_for_completion", Bool),
    ],
};

/// `GET /_cluster/health/{index}`
pub static CLUSTER_HEALTH: EndpointSpec = EndpointSpec {
    name: "cluster.health",
    method: Method::GET,
    path: &[Lit("_cluster"), Lit("health"), Param("index")],
    required: &[],
    body: BodyRule::None,
    params: &[
        ParamSpec::new("expand_wildcards", Str),
        ParamSpec::new("level", Str),
        ParamSpec::new("local", Bool),
        ParamSpec::new("master_timeout", Duration),
        ParamSpec::new("timeout", Duration),
        ParamSpec::new("wait_for_active_shards", Str),
        ParamSpec::new("wait_for_events", Str),
        ParamSpec::new("wait_for_no_initializing_shards", Bool),
        ParamSpec::new("wait_for_no_relocating_shards", Bool),
        ParamSpec::new("wait_for_nodes", Str),
        ParamSpec::new("wait_for_status", Str),
    ],
};

/// `POST /_ml/anomaly_detectors/{job_id}/results/buckets/{timestamp}`
///
/// `start` and `end` accept either a timestamp or a date-math expression.
pub static ML_GET_BUCKETS: EndpointSpec = EndpointSpec {
    name: "ml.get_buckets",
    method: Method::POST,
    path: &[
        Lit("_ml"),
        Lit("anomaly_detectors"),
        Param("job_id"),
        Lit("results"),
        Lit("buckets"),
        Param("timestamp"),
    ],
    required: &["job_id"],
    body: BodyRule::Optional,
    params: &[
        ParamSpec::new("desc", Bool),
        ParamSpec::new("end", Time),
        ParamSpec::new("exclude_interim", Bool),
        ParamSpec::new("expand", Bool),
        ParamSpec::new("from", Int),
        ParamSpec::new("size", Int),
        ParamSpec::new("sort", Str),
        ParamSpec::new("start", Time),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    static ALL: &[&EndpointSpec] = &[
        &INFO,
        &SEARCH,
        &INDEX,
        &GET,
        &DELETE,
        &INDICES_CREATE,
        &INDICES_FORCEMERGE,
        &CLUSTER_HEALTH,
        &ML_GET_BUCKETS,
    ];

    #[test]
    fn test_required_names_are_path_params() {
        for spec in ALL {
            for name in spec.required {
                assert!(
                    spec.path.contains(&Param(*name)),
                    "{}: required `{}` missing from path",
                    spec.name,
                    name
                );
            }
        }
    }

    #[test]
    fn test_param_names_are_unique() {
        for spec in ALL {
            let mut names: Vec<&str> = spec.params.iter().map(|p| p.name).collect();
            names.sort_unstable();
            let len = names.len();
            names.dedup();
            assert_eq!(names.len(), len, "{} declares a parameter twice", spec.name);
        }
    }
}
