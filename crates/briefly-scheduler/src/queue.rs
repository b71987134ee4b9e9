/// The six logical queues (spec §4.7). `Score` covers both dedup/clustering
/// and scoring proper, matching the spec's own grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Queue {
    Ingest,
    Extract,
    Embed,
    Score,
    Summarise,
    Email,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::Ingest => "ingest",
            Queue::Extract => "extract",
            Queue::Embed => "embed",
            Queue::Score => "score",
            Queue::Summarise => "summarise",
            Queue::Email => "email",
        }
    }
}
