use crate::models::DnsRecord;
use providers::EmbeddingProvider;

/// Canonical text form of a record's resolution content. Correlation
/// decoration is deliberately excluded so the same observation embeds
/// identically whether or not an engine has touched it.
pub fn record_text(record: &DnsRecord) -> String {
    let mut parts: Vec<String> = vec![record.host.clone()];
    if let Some(status) = &record.status_code {
        parts.push(status.clone());
    }
    for family in [
        &record.a,
        &record.aaaa,
        &record.cname,
        &record.mx,
        &record.ns,
        &record.txt,
    ] {
        parts.extend(family.iter().cloned());
    }
    parts.join(" ")
}

pub async fn embed_record(
    provider: &dyn EmbeddingProvider,
    record: &DnsRecord,
) -> anyhow::Result<Vec<f32>> {
    let texts = vec![record_text(record)];
    let mut resp = provider.embed(&texts).await?;
    resp.vectors
        .pop()
        .ok_or_else(|| anyhow::anyhow!("embedding provider returned no vector"))
}
