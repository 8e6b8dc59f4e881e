//! Structured knowledge base the structured responder reads from.
//!
//! Read-only keyword SELECTs over the scholarships and universities tables,
//! ordered descending by relevance and capped at a caller-supplied limit.
//! The only write surface is the idempotent seeding of starter rows.

use std::sync::Arc;

use supersearch_core::error::SearchError;

use crate::db::Database;

/// One matched knowledge row, flattened to what the responder formats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeRow {
    /// Source table ("scholarships" or "universities").
    pub table: String,
    /// Row name (scholarship or university name).
    pub name: String,
    /// Main descriptive column (provider + amount, or location + programs).
    pub detail: String,
    /// Further detail (eligibility, or about/contact).
    pub extra: String,
    /// Link column.
    pub link: String,
}

/// Query interface over the knowledge tables.
pub struct KnowledgeBase {
    db: Arc<Database>,
}

impl KnowledgeBase {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Search scholarships whose name, field of study, provider, or
    /// eligibility matches any of the keywords. Most relevant rows first.
    pub fn search_scholarships(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<KnowledgeRow>, SearchError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        self.db.with_conn(|conn| {
            let (clause, params) = like_clause(
                &["name", "field_of_study", "provider", "eligibility"],
                keywords,
            );
            let sql = format!(
                "SELECT name, provider, field_of_study, amount, eligibility, link
                 FROM scholarships
                 WHERE {}
                 ORDER BY relevance DESC
                 LIMIT {}",
                clause, limit
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    let name: String = row.get(0)?;
                    let provider: String = row.get(1)?;
                    let field: String = row.get(2)?;
                    let amount: String = row.get(3)?;
                    let eligibility: String = row.get(4)?;
                    let link: String = row.get(5)?;
                    Ok(KnowledgeRow {
                        table: "scholarships".to_string(),
                        name,
                        detail: format!("{} - {} ({})", provider, amount, field),
                        extra: eligibility,
                        link,
                    })
                })
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            collect_rows(rows)
        })
    }

    /// Search universities whose name, location, programs, or about text
    /// matches any of the keywords. Most relevant rows first.
    pub fn search_universities(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<KnowledgeRow>, SearchError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        self.db.with_conn(|conn| {
            let (clause, params) = like_clause(&["name", "location", "programs", "about"], keywords);
            let sql = format!(
                "SELECT name, location, programs, about, contact, website
                 FROM universities
                 WHERE {}
                 ORDER BY relevance DESC
                 LIMIT {}",
                clause, limit
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                    let name: String = row.get(0)?;
                    let location: String = row.get(1)?;
                    let programs: String = row.get(2)?;
                    let about: String = row.get(3)?;
                    let contact: String = row.get(4)?;
                    let website: String = row.get(5)?;
                    let extra = if contact.is_empty() {
                        about
                    } else {
                        format!("{} Contact: {}", about, contact)
                    };
                    Ok(KnowledgeRow {
                        table: "universities".to_string(),
                        name,
                        detail: format!("{} - {}", location, programs),
                        extra,
                        link: website,
                    })
                })
                .map_err(|e| SearchError::Storage(e.to_string()))?;

            collect_rows(rows)
        })
    }

    /// Total rows across both knowledge tables.
    pub fn count(&self) -> Result<u64, SearchError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT (SELECT COUNT(*) FROM scholarships)
                          + (SELECT COUNT(*) FROM universities)",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| SearchError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    /// Insert the curated starter rows if both tables are empty.
    ///
    /// Safe to call on every startup.
    pub fn seed_defaults(&self) -> Result<bool, SearchError> {
        if self.count()? > 0 {
            return Ok(false);
        }
        self.db.with_conn(|conn| {
            conn.execute_batch(SEED_SQL)
                .map_err(|e| SearchError::Storage(format!("Failed to seed knowledge: {}", e)))?;
            Ok(())
        })?;
        tracing::info!("Knowledge base seeded with starter rows");
        Ok(true)
    }
}

/// Build an OR'd LIKE clause over the given columns for each keyword,
/// returning the clause and the positional parameters.
fn like_clause(columns: &[&str], keywords: &[String]) -> (String, Vec<String>) {
    let mut parts = Vec::new();
    let mut params = Vec::new();
    let mut idx = 1;
    for keyword in keywords {
        for column in columns {
            parts.push(format!("{} LIKE ?{} COLLATE NOCASE", column, idx));
            idx += 1;
            params.push(format!("%{}%", keyword));
        }
    }
    (parts.join(" OR "), params)
}

fn collect_rows(
    rows: impl Iterator<Item = Result<KnowledgeRow, rusqlite::Error>>,
) -> Result<Vec<KnowledgeRow>, SearchError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| SearchError::Storage(e.to_string()))?);
    }
    Ok(out)
}

/// Starter data: a small curated slice of the Malaysian study-abroad domain.
const SEED_SQL: &str = "
    INSERT INTO scholarships (name, provider, field_of_study, amount, eligibility, link, relevance) VALUES
        ('Malaysia International Scholarship', 'Ministry of Higher Education', 'Postgraduate, all fields',
         'Full tuition + stipend', 'International postgraduate students from eligible countries',
         'https://biasiswa.mohe.gov.my/INTER', 100),
        ('UM Merit Scholarship', 'Universiti Malaya', 'Computer Science; Engineering',
         'RM 10,000 per year', 'CGPA 3.7 and above', 'https://um.edu.my/scholarships', 90),
        ('Petronas Education Sponsorship', 'Petronas', 'Engineering; Technology',
         'Full sponsorship', 'Outstanding STEM students', 'https://educationsponsorship.petronas.com', 85),
        ('Sunway Excellence Scholarship', 'Sunway University', 'Business; Computing',
         'Up to 100% tuition', 'Strong academic record', 'https://sunwayuniversity.edu.my/scholarship', 80),
        ('Taylor''s Merit Scholarship', 'Taylor''s University', 'Hospitality; Design; Computing',
         'Up to 75% tuition', 'Merit-based entry assessment', 'https://university.taylors.edu.my/scholarships', 75),
        ('APU Merit Scholarship', 'Asia Pacific University', 'ICT; Computer Science',
         'Up to RM 25,000', 'Strong results in ICT-related subjects', 'https://www.apu.edu.my/scholarships', 70);

    INSERT INTO universities (name, location, programs, website, about, contact, relevance) VALUES
        ('Universiti Malaya', 'Kuala Lumpur', 'Computer Science; Medicine; Engineering; Law',
         'https://um.edu.my', 'Malaysia''s oldest and highest-ranked university.', 'info@um.edu.my', 100),
        ('Universiti Kebangsaan Malaysia', 'Bangi, Selangor', 'Science; Medicine; Engineering',
         'https://www.ukm.my', 'The National University of Malaysia.', 'info@ukm.my', 90),
        ('Universiti Sains Malaysia', 'Penang', 'Science; Technology; Health Sciences',
         'https://www.usm.my', 'Research-intensive university with its main campus in Penang.', 'info@usm.my', 85),
        ('Universiti Teknologi Malaysia', 'Skudai, Johor', 'Engineering; Technology; Computer Science',
         'https://www.utm.my', 'Renowned for engineering and technology programs.', 'info@utm.my', 80),
        ('Monash University Malaysia', 'Bandar Sunway, Selangor', 'Medicine; Engineering; Business; IT',
         'https://www.monash.edu.my', 'Malaysian campus of Australia''s Monash University.', 'study@monash.edu.my', 75),
        ('Sunway University', 'Bandar Sunway, Selangor', 'Business; Hospitality; Computing',
         'https://sunwayuniversity.edu.my', 'Private university known for business and computing.', 'info@sunway.edu.my', 70),
        ('Asia Pacific University', 'Kuala Lumpur', 'ICT; Computer Science; Business',
         'https://www.apu.edu.my', 'Specialises in technology and innovation programs.', 'info@apu.edu.my', 65);
";

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_kb() -> KnowledgeBase {
        let kb = KnowledgeBase::new(Arc::new(Database::in_memory().unwrap()));
        kb.seed_defaults().unwrap();
        kb
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    // ---- Seeding ----

    #[test]
    fn test_seed_populates_empty_tables() {
        let kb = KnowledgeBase::new(Arc::new(Database::in_memory().unwrap()));
        assert_eq!(kb.count().unwrap(), 0);
        assert!(kb.seed_defaults().unwrap());
        assert!(kb.count().unwrap() > 0);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let kb = make_kb();
        let count = kb.count().unwrap();
        assert!(!kb.seed_defaults().unwrap());
        assert_eq!(kb.count().unwrap(), count);
    }

    // ---- Scholarship search ----

    #[test]
    fn test_search_scholarships_by_field() {
        let kb = make_kb();
        let rows = kb
            .search_scholarships(&kw(&["computer science"]), 5)
            .unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.table == "scholarships"));
    }

    #[test]
    fn test_search_scholarships_limit() {
        let kb = make_kb();
        let rows = kb.search_scholarships(&kw(&["scholarship"]), 2).unwrap();
        assert!(rows.len() <= 2);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let kb = make_kb();
        let lower = kb.search_scholarships(&kw(&["petronas"]), 5).unwrap();
        let upper = kb.search_scholarships(&kw(&["PETRONAS"]), 5).unwrap();
        assert_eq!(lower.len(), upper.len());
        assert!(!lower.is_empty());
    }

    #[test]
    fn test_search_ordered_by_relevance() {
        let kb = make_kb();
        // "scholarship" appears in most seed names; the top row must be the
        // highest-relevance one.
        let rows = kb.search_scholarships(&kw(&["scholarship"]), 10).unwrap();
        assert_eq!(rows[0].name, "Malaysia International Scholarship");
    }

    #[test]
    fn test_search_no_match_returns_empty() {
        let kb = make_kb();
        let rows = kb
            .search_scholarships(&kw(&["quantum chromodynamics"]), 5)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_search_empty_keywords_returns_empty() {
        let kb = make_kb();
        assert!(kb.search_scholarships(&[], 5).unwrap().is_empty());
        assert!(kb.search_universities(&[], 5).unwrap().is_empty());
    }

    // ---- University search ----

    #[test]
    fn test_search_universities_by_location() {
        let kb = make_kb();
        let rows = kb.search_universities(&kw(&["penang"]), 5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Universiti Sains Malaysia");
        assert!(rows[0].link.contains("usm.my"));
    }

    #[test]
    fn test_search_universities_rows_carry_links() {
        let kb = make_kb();
        let rows = kb.search_universities(&kw(&["malaysia"]), 10).unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.link.starts_with("https://")));
    }

    #[test]
    fn test_multiple_keywords_widen_match() {
        let kb = make_kb();
        let narrow = kb.search_universities(&kw(&["penang"]), 10).unwrap();
        let wide = kb
            .search_universities(&kw(&["penang", "johor"]), 10)
            .unwrap();
        assert!(wide.len() > narrow.len());
    }

    // ---- like_clause helper ----

    #[test]
    fn test_like_clause_shape() {
        let (clause, params) = like_clause(&["a", "b"], &kw(&["x", "y"]));
        assert_eq!(params.len(), 4);
        assert_eq!(params[0], "%x%");
        assert_eq!(clause.matches(" OR ").count(), 3);
        assert!(clause.contains("a LIKE ?1"));
        assert!(clause.contains("b LIKE ?4"));
    }
}
