use serde::{
    Deserialize,
    Serialize,
};

/// Names the emitter writes into the generated fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Namespace of the entry point procedures. Empty for the global namespace.
    pub namespace: String,
    /// Macro selecting between the procedures and the register tables.
    pub guard: String,
    /// Name of the auxiliary mode in the register tables.
    pub auxiliary_label: String,
    /// Whether to start the fragment with a "do not edit" comment.
    pub header: bool,
}

impl EmitterConfig {
    pub fn entry_point_prefix(&self) -> String {
        if self.namespace.is_empty() {
            "bool ".to_string()
        } else {
            format!("bool {}::", self.namespace)
        }
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            namespace: "llvm".to_string(),
            guard: "GET_CC_REGISTER_LISTS".to_string(),
            auxiliary_label: "Swift".to_string(),
            header: true,
        }
    }
}
