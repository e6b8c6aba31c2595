use serde_json::Value;

use placehub_common::ValidationError;

/// Converte um valor JSON para string do jeito que um `String(x)` faria.
///
/// Números com valor inteiro saem sem casa decimal (`1.0` vira `"1"`), arrays
/// viram a junção dos elementos com `,` e objetos viram `"[object Object]"`.
/// `None` só para `null`.
fn to_js_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => js_number(f),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| to_js_string(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some("[object Object]".to_string()),
    }
}

/// `Number.prototype.toString` para um f64 finito.
fn js_number(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let abs = f.abs();
    if abs >= 1e21 || abs < 1e-6 {
        // notação exponencial, sempre com sinal no expoente
        let s = format!("{f:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    // Display de f64 já usa a menor representação e omite ".0"
    format!("{f}")
}

/// Campo obrigatório: ausente, `null` ou string vazia vira `missing`.
pub(crate) fn coerce_required(
    value: Option<&Value>,
    missing: ValidationError,
) -> Result<String, ValidationError> {
    match value.and_then(to_js_string) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(missing),
    }
}

/// Campo opcional: ausente ou `null` vira `None`.
pub(crate) fn coerce_optional(value: Option<&Value>) -> Option<String> {
    value.and_then(to_js_string)
}

/// Campo obrigatório com semântica de "truthiness": `false`, `0` e `""`
/// contam como ausentes.
pub(crate) fn coerce_truthy(
    value: Option<&Value>,
    missing: ValidationError,
) -> Result<String, ValidationError> {
    let Some(value) = value else {
        return Err(missing);
    };
    let falsy = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    if falsy {
        return Err(missing);
    }
    to_js_string(value).ok_or(missing)
}
