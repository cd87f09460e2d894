use serde_json::Value;

/// Provider identity signals available to the gateway for one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Backend endpoint the call was dispatched to
    pub api_base: Option<String>,
    /// Provider-side model identifier the gateway resolved
    pub provider_model: Option<String>,
}

impl CallContext {
    pub fn new(api_base: Option<&str>, provider_model: Option<&str>) -> Self {
        Self {
            api_base: api_base.map(str::to_string),
            provider_model: provider_model.map(str::to_string),
        }
    }

    /// Read the signals from a gateway call map.
    ///
    /// The provider model is the first non-empty of `litellm_model_name`
    /// (top level, then `litellm_params`) and `model` (same order).
    pub fn from_call(call: &Value) -> Self {
        let params = call.get("litellm_params");
        let text = |v: Option<&Value>| {
            v.and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let api_base = text(params.and_then(|p| p.get("api_base")));
        let provider_model = text(call.get("litellm_model_name"))
            .or_else(|| text(params.and_then(|p| p.get("litellm_model_name"))))
            .or_else(|| text(call.get("model")))
            .or_else(|| text(params.and_then(|p| p.get("model"))));

        Self {
            api_base,
            provider_model,
        }
    }
}
