use async_trait::async_trait;
use sqlx::Row;

use exam_core::model::{
    BankId, QuestionId, QuestionResponse, RecordId, SessionId, SubmissionRecord,
};
use exam_core::score::{DomainScore, ScoreSummary};

use super::SqliteRepository;
use super::mapping::{
    domain_from_str, domain_to_str, from_json, mode_from_str, mode_to_str,
    question_type_from_str, question_type_to_str, ser, to_json, u32_from_i64, usize_from_i64,
};
use crate::repository::{HistoryRepository, OverallStats, StorageError};

fn connection<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn save_error(e: sqlx::Error) -> StorageError {
    if e.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
    {
        StorageError::Conflict
    } else {
        StorageError::Connection(e.to_string())
    }
}

impl SqliteRepository {
    async fn fetch_responses(
        &self,
        submission_id: &str,
    ) -> Result<Vec<QuestionResponse>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id, question_type, domain, objective,
                       submitted_answer, correct_answer, is_correct, score
                FROM question_responses
                WHERE submission_id = ?1
                ORDER BY position
            ",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection)?;

        let mut responses = Vec::with_capacity(rows.len());
        for row in rows {
            let submitted = row
                .try_get::<Option<String>, _>("submitted_answer")
                .map_err(ser)?
                .map(|raw| from_json(&raw))
                .transpose()?;
            responses.push(QuestionResponse {
                question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
                question_type: question_type_from_str(
                    &row.try_get::<String, _>("question_type").map_err(ser)?,
                )?,
                domain: domain_from_str(&row.try_get::<String, _>("domain").map_err(ser)?)?,
                objective: row.try_get("objective").map_err(ser)?,
                submitted,
                correct_answer: from_json(&row.try_get::<String, _>("correct_answer").map_err(ser)?)?,
                is_correct: row.try_get("is_correct").map_err(ser)?,
                score: row.try_get("score").map_err(ser)?,
            });
        }
        Ok(responses)
    }

    async fn fetch_domain_breakdown(
        &self,
        submission_id: &str,
    ) -> Result<Vec<DomainScore>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT domain, total, correct, earned, percentage
                FROM domain_scores
                WHERE submission_id = ?1
                ORDER BY domain
            ",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(connection)?;

        let mut breakdown = Vec::with_capacity(rows.len());
        for row in rows {
            breakdown.push(DomainScore {
                domain: domain_from_str(&row.try_get::<String, _>("domain").map_err(ser)?)?,
                total: usize_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
                correct: usize_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
                earned: row.try_get("earned").map_err(ser)?,
                percentage: row.try_get("percentage").map_err(ser)?,
            });
        }
        Ok(breakdown)
    }

    async fn assemble_record(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<SubmissionRecord, StorageError> {
        let submission_id: String = row.try_get("id").map_err(ser)?;
        let bank_ids: Vec<BankId> =
            from_json(&row.try_get::<String, _>("bank_ids").map_err(ser)?)?;

        let summary = ScoreSummary {
            total_questions: usize_from_i64(
                "total_questions",
                row.try_get::<i64, _>("total_questions").map_err(ser)?,
            )?,
            correct_count: usize_from_i64(
                "correct_count",
                row.try_get::<i64, _>("correct_count").map_err(ser)?,
            )?,
            earned_points: row.try_get("earned_points").map_err(ser)?,
            raw_percentage: row.try_get("raw_percentage").map_err(ser)?,
            scaled_score: u32_from_i64(
                "scaled_score",
                row.try_get::<i64, _>("scaled_score").map_err(ser)?,
            )?,
            passed: row.try_get("passed").map_err(ser)?,
            elapsed_seconds: u32_from_i64(
                "elapsed_seconds",
                row.try_get::<i64, _>("elapsed_seconds").map_err(ser)?,
            )?,
            domain_breakdown: self.fetch_domain_breakdown(&submission_id).await?,
        };
        let responses = self.fetch_responses(&submission_id).await?;

        SubmissionRecord::from_persisted(
            SessionId::new(row.try_get::<String, _>("session_id").map_err(ser)?),
            mode_from_str(&row.try_get::<String, _>("mode").map_err(ser)?)?,
            bank_ids,
            row.try_get("started_at").map_err(ser)?,
            row.try_get("completed_at").map_err(ser)?,
            summary,
            responses,
        )
        .map_err(ser)
    }
}

const SUBMISSION_COLUMNS: &str = r"
    id, session_id, mode, bank_ids, started_at, completed_at,
    elapsed_seconds, total_questions, correct_count, earned_points,
    raw_percentage, scaled_score, passed
";

#[async_trait]
impl HistoryRepository for SqliteRepository {
    async fn save(&self, record: &SubmissionRecord) -> Result<RecordId, StorageError> {
        let record_id = RecordId::generate();
        let summary = record.summary();
        let total = i64::try_from(summary.total_questions).map_err(ser)?;
        let correct = i64::try_from(summary.correct_count).map_err(ser)?;

        let mut tx = self.pool.begin().await.map_err(connection)?;

        sqlx::query(
            r"
                INSERT INTO submissions (
                    id, session_id, mode, bank_ids, started_at, completed_at,
                    elapsed_seconds, total_questions, correct_count,
                    earned_points, raw_percentage, scaled_score, passed
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
        )
        .bind(record_id.as_str())
        .bind(record.session_id().as_str())
        .bind(mode_to_str(record.mode()))
        .bind(to_json(&record.bank_ids())?)
        .bind(record.started_at())
        .bind(record.completed_at())
        .bind(i64::from(summary.elapsed_seconds))
        .bind(total)
        .bind(correct)
        .bind(summary.earned_points)
        .bind(summary.raw_percentage)
        .bind(i64::from(summary.scaled_score))
        .bind(summary.passed)
        .execute(&mut *tx)
        .await
        .map_err(save_error)?;

        for (position, response) in record.responses().iter().enumerate() {
            let submitted = response
                .submitted
                .as_ref()
                .map(to_json)
                .transpose()?;
            sqlx::query(
                r"
                    INSERT INTO question_responses (
                        submission_id, position, question_id, question_type,
                        domain, objective, submitted_answer, correct_answer,
                        is_correct, score
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ",
            )
            .bind(record_id.as_str())
            .bind(i64::try_from(position).map_err(ser)?)
            .bind(response.question_id.as_str())
            .bind(question_type_to_str(response.question_type))
            .bind(domain_to_str(response.domain))
            .bind(response.objective.as_str())
            .bind(submitted)
            .bind(to_json(&response.correct_answer)?)
            .bind(response.is_correct)
            .bind(response.score)
            .execute(&mut *tx)
            .await
            .map_err(connection)?;
        }

        for entry in &summary.domain_breakdown {
            sqlx::query(
                r"
                    INSERT INTO domain_scores (
                        submission_id, domain, total, correct, earned, percentage
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(record_id.as_str())
            .bind(domain_to_str(entry.domain))
            .bind(i64::try_from(entry.total).map_err(ser)?)
            .bind(i64::try_from(entry.correct).map_err(ser)?)
            .bind(entry.earned)
            .bind(entry.percentage)
            .execute(&mut *tx)
            .await
            .map_err(connection)?;
        }

        tx.commit().await.map_err(connection)?;
        Ok(record_id)
    }

    async fn load_history(&self) -> Result<Vec<SubmissionRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions ORDER BY completed_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(connection)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(self.assemble_record(&row).await?);
        }
        Ok(records)
    }

    async fn get_record(&self, id: &RecordId) -> Result<SubmissionRecord, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(connection)?
        .ok_or(StorageError::NotFound)?;

        self.assemble_record(&row).await
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(connection)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn overall_stats(&self) -> Result<OverallStats, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    COUNT(*) AS total_attempts,
                    COALESCE(SUM(CASE WHEN mode = 'study' THEN 1 ELSE 0 END), 0) AS study_attempts,
                    COALESCE(SUM(CASE WHEN mode = 'exam' THEN 1 ELSE 0 END), 0) AS exam_attempts,
                    COALESCE(SUM(CASE WHEN passed = 1 THEN 1 ELSE 0 END), 0) AS pass_count,
                    COALESCE(AVG(raw_percentage), 0.0) AS average_percentage,
                    COALESCE(MAX(raw_percentage), 0.0) AS best_percentage
                FROM submissions
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(connection)?;

        Ok(OverallStats {
            total_attempts: usize_from_i64(
                "total_attempts",
                row.try_get::<i64, _>("total_attempts").map_err(ser)?,
            )?,
            study_attempts: usize_from_i64(
                "study_attempts",
                row.try_get::<i64, _>("study_attempts").map_err(ser)?,
            )?,
            exam_attempts: usize_from_i64(
                "exam_attempts",
                row.try_get::<i64, _>("exam_attempts").map_err(ser)?,
            )?,
            pass_count: usize_from_i64(
                "pass_count",
                row.try_get::<i64, _>("pass_count").map_err(ser)?,
            )?,
            average_percentage: row.try_get("average_percentage").map_err(ser)?,
            best_percentage: row.try_get("best_percentage").map_err(ser)?,
        })
    }
}
