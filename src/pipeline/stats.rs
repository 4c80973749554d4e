use std::fmt;

/// Why an index entry was skipped before its detail was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    Type,
    Ressort,
    Watermark,
}

/// What happened to an eligible article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleOutcome {
    Inserted,
    Duplicate,
    NoFulltext,
}

/// Counters of one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ingest_date: String,
    pub watermark: Option<String>,
    pub api_returned: usize,
    pub eligible: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub no_fulltext: usize,
    pub failed: usize,
    pub filtered_type: usize,
    pub filtered_ressort: usize,
    pub filtered_watermark: usize,
}

impl RunStats {
    pub fn new(ingest_date: String, watermark: Option<String>) -> Self {
        Self {
            ingest_date,
            watermark,
            ..Default::default()
        }
    }

    pub fn record_filtered(&mut self, reason: FilterReason) {
        match reason {
            FilterReason::Type => self.filtered_type += 1,
            FilterReason::Ressort => self.filtered_ressort += 1,
            FilterReason::Watermark => self.filtered_watermark += 1,
        }
    }

    pub fn record_outcome(&mut self, outcome: ArticleOutcome) {
        match outcome {
            ArticleOutcome::Inserted => self.inserted += 1,
            ArticleOutcome::Duplicate => self.duplicates += 1,
            ArticleOutcome::NoFulltext => self.no_fulltext += 1,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tagesschau ingest summary ({})", self.ingest_date)?;
        writeln!(
            f,
            "  Watermark:            {}",
            self.watermark.as_deref().unwrap_or("none")
        )?;
        writeln!(f, "  Returned by index:    {}", self.api_returned)?;
        writeln!(f, "  Eligible:             {}", self.eligible)?;
        writeln!(f, "  Inserted:             {}", self.inserted)?;
        writeln!(f, "  Already stored:       {}", self.duplicates)?;
        writeln!(f, "  No fulltext:          {}", self.no_fulltext)?;
        writeln!(f, "  Failed:               {}", self.failed)?;
        writeln!(f, "  Filtered (type):      {}", self.filtered_type)?;
        writeln!(f, "  Filtered (ressort):   {}", self.filtered_ressort)?;
        write!(f, "  Filtered (watermark): {}", self.filtered_watermark)
    }
}

/// Counters of one metadata recompute pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
}

impl fmt::Display for RecomputeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Recomputed metadata: {} of {} rows updated, {} failed",
            self.updated, self.total, self.failed
        )
    }
}
