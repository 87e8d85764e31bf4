//! AI Core endpoints.
//!
//! Every call returns `Outcome::Failed` for an HTTP error when the client does
//! not fail on error; see [`Client::last_error`].

use super::core::Client;
use super::options::{Features, FitOptions, PredictOptions};
use super::validation::validate_url;
use crate::resources::{map_all_as, map_as, map_one, Algorithm, Algorithms, Resource, ResourceKind, Task, Version};
use crate::transport::ApiRequest;
use crate::types::{Artifact, Outcome, TemplateKind};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::missing_field(field, "client"));
    }
    Ok(())
}

/// Inject `algorithm_id` into every version object of a versions payload.
fn with_algorithm_id(decoded: Outcome<Value>, algorithm_id: &str) -> Outcome<Value> {
    let inject = |value: &mut Value| {
        if let Value::Object(map) = value {
            map.insert("algorithm_id".to_string(), Value::String(algorithm_id.to_string()));
        }
    };
    decoded.map(|mut value| {
        match &mut value {
            Value::Array(items) => items.iter_mut().for_each(inject),
            other => inject(other),
        }
        value
    })
}

/// Fill in `job_id` on task answers that omit it; the path already names the job.
fn with_job_id(decoded: Outcome<Value>, job_id: &str) -> Outcome<Value> {
    decoded.map(|mut value| {
        if let Value::Object(map) = &mut value {
            let missing = map
                .get("job_id")
                .map_or(true, |v| v.is_null() || v.as_str() == Some(""));
            if missing {
                map.insert("job_id".to_string(), Value::String(job_id.to_string()));
            }
        }
        value
    })
}

impl Client {
    /// `GET /algorithms`
    pub fn get_algorithms(&self) -> Result<Outcome<Algorithms>> {
        let decoded = self.requester().json(ApiRequest::get("/algorithms"))?;
        decoded.try_map(|value| {
            let entries = match value {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                obj @ Value::Object(_) => vec![obj],
                other => {
                    return Err(Error::validation_with_context(
                        "expected a list of algorithms",
                        ErrorContext::new()
                            .with_details(format!("got {}", other))
                            .with_source("client"),
                    ))
                }
            };
            Ok(Algorithms::new(entries, self.clone()))
        })
    }

    /// `GET /algorithms/{id}`
    pub fn get_algorithm(&self, algorithm_id: &str) -> Result<Outcome<Algorithm>> {
        require(algorithm_id, "algorithm_id")?;
        let decoded = self
            .requester()
            .json(ApiRequest::get(format!("/algorithms/{}", algorithm_id)))?;
        map_as(decoded, self)
    }

    /// `GET /algorithms/{id}/versions`
    pub fn get_algorithm_versions(&self, algorithm_id: &str) -> Result<Outcome<Vec<Version>>> {
        require(algorithm_id, "algorithm_id")?;
        let decoded = self
            .requester()
            .json(ApiRequest::get(format!("/algorithms/{}/versions", algorithm_id)))?;
        map_all_as(with_algorithm_id(decoded, algorithm_id), self)
    }

    /// `GET /algorithms/{id}/versions/{version}`
    pub fn get_algorithm_version(&self, algorithm_id: &str, version: &str) -> Result<Outcome<Version>> {
        require(algorithm_id, "algorithm_id")?;
        require(version, "version")?;
        let decoded = self.requester().json(ApiRequest::get(format!(
            "/algorithms/{}/versions/{}",
            algorithm_id, version
        )))?;
        map_as(with_algorithm_id(decoded, algorithm_id), self)
    }

    /// `GET /algorithms/tasks/{job_id}`
    pub fn get_task_result(&self, job_id: &str) -> Result<Outcome<Task>> {
        require(job_id, "job_id")?;
        let decoded = self
            .requester()
            .json(ApiRequest::get(format!("/algorithms/tasks/{}", job_id)))?;
        map_as(with_job_id(decoded, job_id), self)
    }

    /// `DELETE /algorithms/tasks/{job_id}`
    pub fn cancel_task(&self, job_id: &str) -> Result<Outcome<Task>> {
        require(job_id, "job_id")?;
        let decoded = self
            .requester()
            .json(ApiRequest::delete(format!("/algorithms/tasks/{}", job_id)))?;
        map_as(with_job_id(decoded, job_id), self)
    }

    /// `POST /algorithms/{id}/predict`
    ///
    /// Yields a [`Resource::Prediction`] when the service answered right away,
    /// a [`Resource::Task`] when it escalated the request to a background job.
    pub fn get_prediction(
        &self,
        algorithm_id: &str,
        features: impl Into<Features>,
        options: &PredictOptions,
    ) -> Result<Outcome<Resource>> {
        require(algorithm_id, "algorithm_id")?;

        let callback_url = match &options.callback_url {
            Some(url) => {
                validate_url(url, "callback_url")?;
                Some(url.clone())
            }
            None => self.callback_url(),
        };
        let callback_param = serde_json::to_string(options.callback_param.as_ref().unwrap_or(&Value::Null))?;

        let mut request = ApiRequest::post(format!("/algorithms/{}/predict", algorithm_id))
            .field("evaluate", options.evaluate.to_value())
            .field("encrypt", options.encrypt)
            .field("callback_param", callback_param);
        if let Some(url) = callback_url {
            request = request.field("callback_url", url);
        }
        if let Some(version) = &options.version {
            request = request.field("version", version.as_str());
        }
        let request = request.file(
            "features",
            features.into().into_part(&options.content_type)?,
        );

        let decoded = self.requester().json(request)?;
        let kind = match &decoded {
            Outcome::Resource(payload) => ResourceKind::for_prediction(payload),
            _ => ResourceKind::Prediction,
        };
        map_one(kind, decoded, self)
    }

    /// `POST /algorithms/{id}/fit`. Training always runs as a task.
    pub fn train_algorithm(
        &self,
        algorithm_id: &str,
        features: impl Into<Features>,
        options: &FitOptions,
    ) -> Result<Outcome<Task>> {
        require(algorithm_id, "algorithm_id")?;

        let mut request = ApiRequest::post(format!("/algorithms/{}/fit", algorithm_id))
            .field("export_new_version", options.export_new_version);
        if let Some(version) = &options.version {
            request = request.field("version", version.as_str());
        }
        let request = request.file(
            "features",
            features.into().into_part(&options.content_type)?,
        );

        map_as(self.requester().json(request)?, self)
    }

    /// `GET /algorithms/{id}/template`: input or output template as JSON bytes.
    pub fn get_template(
        &self,
        algorithm_id: &str,
        kind: TemplateKind,
        version: Option<&str>,
    ) -> Result<Outcome<Artifact>> {
        require(algorithm_id, "algorithm_id")?;
        let request = ApiRequest::get(format!("/algorithms/{}/template", algorithm_id))
            .query("type", kind.as_str())
            .query_opt("version", version);
        Ok(self
            .requester()
            .bytes(request)?
            .map(|bytes| Artifact::template(algorithm_id, kind, bytes)))
    }

    /// `GET /algorithms/{id}/graph`: input or output graph as PNG bytes.
    pub fn get_graph(
        &self,
        algorithm_id: &str,
        kind: TemplateKind,
        version: Option<&str>,
    ) -> Result<Outcome<Artifact>> {
        require(algorithm_id, "algorithm_id")?;
        let request = ApiRequest::get(format!("/algorithms/{}/graph", algorithm_id))
            .query("type", kind.as_str())
            .query_opt("version", version);
        Ok(self
            .requester()
            .bytes(request)?
            .map(|bytes| Artifact::graph(algorithm_id, bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{client_with, Scripted};
    use crate::transport::{Method, RequestBody};
    use serde_json::json;

    fn multipart_text(body: &RequestBody) -> String {
        match body {
            RequestBody::Multipart { bytes, .. } => String::from_utf8(bytes.clone()).unwrap(),
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[test]
    fn test_predict_with_job_id_yields_task() {
        let script = Scripted::new();
        script.push(200, r#"{"job_id":"c751dfb7","status":"Pending","callback_param":null}"#);
        let (client, _) = client_with(script);

        let out = client
            .get_prediction("ecolife", json!([{"x": 1}]), &PredictOptions::new())
            .unwrap();
        let task = out.into_resource().and_then(Resource::into_task).unwrap();
        assert_eq!(task.job_id(), "c751dfb7");
    }

    #[test]
    fn test_predict_without_job_id_yields_prediction() {
        let script = Scripted::new();
        script.push(200, r#"{"predictions":{"rul":812},"is_encrypted":false}"#);
        let (client, _) = client_with(script);

        let out = client
            .get_prediction("ecolife", json!([{"x": 1}]), &PredictOptions::new())
            .unwrap();
        let prediction = out.into_resource().and_then(Resource::into_prediction).unwrap();
        assert_eq!(prediction.predictions(), Some(&json!({"rul": 812})));
    }

    #[test]
    fn test_predict_request_fields() {
        let script = Scripted::new();
        let (client, script) = client_with(script);
        client.set_callback_url("https://hooks.example/done").unwrap();

        client
            .get_prediction(
                "ecolife",
                json!({"speed": [1, 2]}),
                &PredictOptions::new()
                    .evaluate(false)
                    .encrypt(true)
                    .callback_param(json!({"car": 7}))
                    .version("1.3.0"),
            )
            .unwrap();

        let seen = script.requests();
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].url, "https://core.test/api/v1/algorithms/ecolife/predict");
        let text = multipart_text(&seen[0].body);
        assert!(text.contains("name=\"evaluate\"\r\n\r\nfalse\r\n"));
        assert!(text.contains("name=\"encrypt\"\r\n\r\ntrue\r\n"));
        assert!(text.contains("name=\"callback_param\"\r\n\r\n{\"car\":7}\r\n"));
        assert!(text.contains("name=\"callback_url\"\r\n\r\nhttps://hooks.example/done\r\n"));
        assert!(text.contains("name=\"version\"\r\n\r\n1.3.0\r\n"));
        assert!(text.contains(
            "name=\"features\"; filename=\"features.json\"\r\nContent-Type: application/json\r\n\r\n{\"speed\":[1,2]}\r\n"
        ));
    }

    #[test]
    fn test_predict_defaults_omit_optional_fields() {
        let (client, script) = client_with(Scripted::new());
        client
            .get_prediction("ecolife", json!([]), &PredictOptions::new())
            .unwrap();

        let text = multipart_text(&script.requests()[0].body);
        assert!(text.contains("name=\"evaluate\"\r\n\r\ntrue\r\n"));
        assert!(text.contains("name=\"callback_param\"\r\n\r\nnull\r\n"));
        assert!(!text.contains("name=\"callback_url\""));
        assert!(!text.contains("name=\"version\""));
    }

    #[test]
    fn test_per_call_callback_url_is_validated() {
        let (client, script) = client_with(Scripted::new());
        let err = client
            .get_prediction("ecolife", json!([]), &PredictOptions::new().callback_url("nope"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(script.requests().is_empty());
    }

    #[test]
    fn test_predict_rate_limited_without_fail_fast() {
        let script = Scripted::new();
        script.push(429, r#"{"error":"Too many requests"}"#);
        let (client, _) = client_with(script);

        let out = client
            .get_prediction("ecolife", json!([]), &PredictOptions::new())
            .unwrap();
        assert!(out.is_failed());
        assert_eq!(client.last_error(), Some(json!({"error": "Too many requests"})));
    }

    #[test]
    fn test_predict_rate_limited_with_fail_fast() {
        let script = Scripted::new();
        script.push(429, r#"{"error":"Too many requests"}"#);
        let (client, _) = client_with(script);
        client.fail_on_error(true);

        let err = client
            .get_prediction("ecolife", json!([]), &PredictOptions::new())
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_versions_get_algorithm_id() {
        let script = Scripted::new();
        script.push(200, r#"[{"version":"1.0.0"},{"version":"1.1.0","change_description":"faster"}]"#);
        let (client, _) = client_with(script);

        let versions = client
            .get_algorithm_versions("ecolife")
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions.iter().all(|v| v.algorithm_id() == "ecolife"));
        assert_eq!(versions[1].change_description(), Some("faster"));
    }

    #[test]
    fn test_fit_always_sends_export_flag() {
        let script = Scripted::new();
        script.push(200, r#"{"job_id":"f1","status":"Pending"}"#);
        let (client, script) = client_with(script);

        let task = client
            .train_algorithm("ecolife", json!([]), &FitOptions::new())
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(task.job_id(), "f1");

        let text = multipart_text(&script.requests()[0].body);
        assert!(text.contains("name=\"export_new_version\"\r\n\r\n\r\n"));
    }

    #[test]
    fn test_template_download() {
        let script = Scripted::new();
        script.push(200, r#"{"speed":"float"}"#);
        let (client, script) = client_with(script);

        let artifact = client
            .get_template("ecolife", TemplateKind::Output, Some("1.0.0"))
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(artifact.file_name, "ecolife-output-template.json");
        assert_eq!(artifact.content_type, "application/json");
        assert_eq!(&artifact.bytes[..], br#"{"speed":"float"}"#);

        let seen = script.requests();
        assert_eq!(
            seen[0].query,
            vec![
                ("type".to_string(), "output".to_string()),
                ("version".to_string(), "1.0.0".to_string())
            ]
        );
    }

    #[test]
    fn test_graph_without_version_omits_query_param() {
        let (client, script) = client_with(Scripted::new());
        let artifact = client
            .get_graph("ecolife", TemplateKind::Input, None)
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(artifact.file_name, "ecolife-graph.png");
        assert_eq!(
            script.requests()[0].query,
            vec![("type".to_string(), "input".to_string())]
        );
    }

    #[test]
    fn test_empty_ids_are_rejected() {
        let (client, script) = client_with(Scripted::new());
        assert!(client.get_task_result("").is_err());
        assert!(client.get_algorithm(" ").is_err());
        assert!(script.requests().is_empty());
    }
}
