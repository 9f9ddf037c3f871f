/// Bucket policy editing for CDN origin access
///
/// A distribution using origin access control reads objects as the
/// CloudFront service principal, scoped by its ARN.
use serde_json::{json, Value};

use crate::error::{Result, StorageError};

const CLOUDFRONT_PRINCIPAL: &str = "cloudfront.amazonaws.com";
const POLICY_VERSION: &str = "2012-10-17";

fn read_statement(bucket: &str, distribution_arn: &str) -> Value {
    json!({
        "Sid": format!("AllowCloudFrontRead-{}", statement_suffix(distribution_arn)),
        "Effect": "Allow",
        "Principal": { "Service": CLOUDFRONT_PRINCIPAL },
        "Action": "s3:GetObject",
        "Resource": format!("arn:aws:s3:::{bucket}/*"),
        "Condition": {
            "StringEquals": { "AWS:SourceArn": distribution_arn }
        }
    })
}

/// Sid characters are limited to alphanumerics
fn statement_suffix(distribution_arn: &str) -> String {
    distribution_arn
        .rsplit('/')
        .next()
        .unwrap_or(distribution_arn)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn grants_arn(statement: &Value, distribution_arn: &str) -> bool {
    statement["Principal"]["Service"] == CLOUDFRONT_PRINCIPAL
        && statement["Condition"]["StringEquals"]["AWS:SourceArn"] == distribution_arn
}

/// Policy document granting `distribution_arn` read access to `bucket`
///
/// Existing statements are preserved. Returns `None` when the grant is
/// already present and nothing needs to be written.
pub fn grant_distribution_read(
    existing: Option<&str>,
    bucket: &str,
    distribution_arn: &str,
) -> Result<Option<String>> {
    let invalid = |message: String| StorageError::Policy {
        bucket: bucket.to_string(),
        message,
    };

    let mut policy = match existing.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => serde_json::from_str::<Value>(raw).map_err(|e| invalid(e.to_string()))?,
        None => json!({ "Version": POLICY_VERSION, "Statement": [] }),
    };

    // A single statement object is valid policy syntax
    if policy["Statement"].is_object() {
        let single = policy["Statement"].take();
        policy["Statement"] = Value::Array(vec![single]);
    }

    let statements = policy
        .get_mut("Statement")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| invalid("policy has no Statement list".to_string()))?;

    if statements.iter().any(|s| grants_arn(s, distribution_arn)) {
        return Ok(None);
    }

    statements.push(read_statement(bucket, distribution_arn));
    Ok(Some(policy.to_string()))
}
