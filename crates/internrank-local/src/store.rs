//! JSON-file candidate store.
//!
//! The catalog is a single JSON array of listings. A missing file reads as an
//! empty catalog; writes go through a temp file + rename so readers never see
//! a half-written array.

use internrank_core::{
    parse_candidates, CandidateStore, CatalogStats, Error, InternshipCandidate, Result,
};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const RECENT_LIMIT: usize = 5;

#[derive(Debug)]
pub struct JsonCatalogStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

fn store_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Store(format!("{}: {e}", path.display()))
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<InternshipCandidate>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) if s.trim().is_empty() => Ok(Vec::new()),
            Ok(s) => parse_candidates(&s).map_err(|e| match e {
                Error::Store(msg) => store_err(&self.path, msg),
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(store_err(&self.path, e)),
        }
    }

    async fn save(&self, candidates: &[InternshipCandidate]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| store_err(parent, e))?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let body = serde_json::to_vec_pretty(candidates).map_err(|e| store_err(&self.path, e))?;
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| store_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| store_err(&self.path, e))
    }

    /// Dashboard view: totals, averages, and the most recent listings.
    pub async fn stats(&self) -> Result<CatalogStats> {
        let all = self.load().await?;
        let total = all.len();
        let (avg_rating, avg_stipend) = if total == 0 {
            (0.0, 0.0)
        } else {
            let n = total as f64;
            (
                all.iter().map(|c| c.rating).sum::<f64>() / n,
                all.iter().map(|c| c.stipend as f64).sum::<f64>() / n,
            )
        };
        let mut recent = all;
        // Listings without an id sort last.
        recent.sort_by(|a, b| b.id.cmp(&a.id));
        recent.truncate(RECENT_LIMIT);
        Ok(CatalogStats {
            total,
            avg_rating,
            avg_stipend,
            recent,
        })
    }

    /// Insert [`sample_internships`] when the catalog is empty. Returns how many were added.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        if !self.load().await?.is_empty() {
            return Ok(0);
        }
        let samples = sample_internships();
        let n = samples.len();
        for c in samples {
            self.insert(c).await?;
        }
        tracing::info!(path = %self.path.display(), seeded = n, "seeded empty catalog");
        Ok(n)
    }
}

#[async_trait::async_trait]
impl CandidateStore for JsonCatalogStore {
    fn name(&self) -> &'static str {
        "json_catalog"
    }

    async fn list(&self) -> Result<Vec<InternshipCandidate>> {
        self.load().await
    }

    async fn insert(&self, mut candidate: InternshipCandidate) -> Result<u64> {
        candidate.validate()?;
        let _guard = self.write_lock.lock().await;
        let mut all = self.load().await?;
        let id = all.iter().filter_map(|c| c.id).max().unwrap_or(0) + 1;
        candidate.id = Some(id);
        all.push(candidate);
        self.save(&all).await?;
        tracing::debug!(path = %self.path.display(), id, "inserted listing");
        Ok(id)
    }
}

/// The two listings a fresh catalog starts with.
pub fn sample_internships() -> Vec<InternshipCandidate> {
    vec![
        InternshipCandidate {
            id: None,
            title: "AI Research Intern".to_string(),
            description: "machine learning deep learning neural networks python research"
                .to_string(),
            required_skills: "python machine learning tensorflow".to_string(),
            preferred_skills: None,
            responsibilities: None,
            organization: "Tech Corp".to_string(),
            duration: "3 months".to_string(),
            stipend: 5000,
            popularity: 90,
            rating: 4.8,
            prestige: 9,
        },
        InternshipCandidate {
            id: None,
            title: "Web Development Intern".to_string(),
            description: "javascript react node js web development frontend".to_string(),
            required_skills: "javascript html css react".to_string(),
            preferred_skills: None,
            responsibilities: None,
            organization: "Web Solutions".to_string(),
            duration: "6 months".to_string(),
            stipend: 3000,
            popularity: 75,
            rating: 4.2,
            prestige: 7,
        },
    ]
}
