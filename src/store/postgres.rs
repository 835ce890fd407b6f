use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{InsertOutcome, ShortFilter, Store, UpdateOutcome};
use crate::domain::{
    AdminChannel, Comment, PublishStats, Short, ShortStatus, SourceChannel, User, VideoRef,
};
use crate::errors::AppError;

const CLAIMED_VIDEO_INDEX: &str = "shorts_claimed_video";
const ONE_ASSISTANT_INDEX: &str = "users_one_assistant_per_videaste";

const SHORT_COLUMNS: &str = "id, source_channel_id, video_id, video_url, video_title, title, status, \
     rolled_at, assigned_to, target_channel_id, deadline, artifact_url, completed_at, \
     validated_at, published_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(name = "Connect to postgres", skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
        Ok(Self::new(pool))
    }

    async fn comments_for(&self, short_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Comment>>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"SELECT id, short_id, author_id, kind, body, created_at
               FROM short_comments
               WHERE short_id = ANY($1)
               ORDER BY created_at, id"#,
        )
        .bind(short_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch short comments"))?;

        let mut by_short: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in rows {
            let short_id = row.short_id;
            by_short.entry(short_id).or_default().push(row.try_into()?);
        }
        Ok(by_short)
    }

    async fn hydrate(&self, rows: Vec<ShortRow>) -> Result<Vec<Short>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut comments = self.comments_for(&ids).await?;
        rows.into_iter()
            .map(|row| -> Result<Short, AppError> {
                let id = row.id;
                let mut short = Short::try_from(row)?;
                short.comments = comments.remove(&id).unwrap_or_default();
                Ok(short)
            })
            .collect()
    }
}

fn db_error(err: sqlx::Error, context: &'static str) -> AppError {
    match err {
        sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
        other => AppError::Database(anyhow::Error::from(other).context(context)),
    }
}

fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

fn corrupt(what: &str, err: AppError) -> AppError {
    AppError::Database(anyhow::anyhow!("Corrupt {} row: {}", what, err))
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    role: String,
    status: String,
    assistant_of: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            role: row.role.parse().map_err(|e| corrupt("user", e))?,
            status: row.status.parse().map_err(|e| corrupt("user", e))?,
            assistant_of: row.assistant_of,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SourceChannelRow {
    id: Uuid,
    channel_id: String,
    name: String,
    content_type: String,
    profile_image: Option<String>,
    video_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<SourceChannelRow> for SourceChannel {
    type Error = AppError;

    fn try_from(row: SourceChannelRow) -> Result<Self, Self::Error> {
        Ok(SourceChannel {
            id: row.id,
            channel_id: row.channel_id,
            name: row.name,
            content_type: row
                .content_type
                .parse()
                .map_err(|e| corrupt("source channel", e))?,
            profile_image: row.profile_image,
            video_count: row.video_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminChannelRow {
    id: Uuid,
    channel_id: String,
    name: String,
    content_type: String,
    created_at: DateTime<Utc>,
    published_count: i64,
    last_published_at: Option<DateTime<Utc>>,
}

impl TryFrom<AdminChannelRow> for AdminChannel {
    type Error = AppError;

    fn try_from(row: AdminChannelRow) -> Result<Self, Self::Error> {
        Ok(AdminChannel {
            id: row.id,
            channel_id: row.channel_id,
            name: row.name,
            content_type: row
                .content_type
                .parse()
                .map_err(|e| corrupt("admin channel", e))?,
            stats: PublishStats {
                published_count: row.published_count,
                last_published_at: row.last_published_at,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShortRow {
    id: Uuid,
    source_channel_id: Uuid,
    video_id: String,
    video_url: String,
    video_title: Option<String>,
    title: Option<String>,
    status: String,
    rolled_at: DateTime<Utc>,
    assigned_to: Option<Uuid>,
    target_channel_id: Option<Uuid>,
    deadline: Option<DateTime<Utc>>,
    artifact_url: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    validated_at: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShortRow> for Short {
    type Error = AppError;

    fn try_from(row: ShortRow) -> Result<Self, Self::Error> {
        Ok(Short {
            id: row.id,
            source_channel_id: row.source_channel_id,
            video: VideoRef {
                video_id: row.video_id,
                url: row.video_url,
                title: row.video_title,
            },
            title: row.title,
            status: row.status.parse().map_err(|e| corrupt("short", e))?,
            rolled_at: row.rolled_at,
            assigned_to: row.assigned_to,
            target_channel_id: row.target_channel_id,
            deadline: row.deadline,
            artifact_url: row.artifact_url,
            completed_at: row.completed_at,
            validated_at: row.validated_at,
            published_at: row.published_at,
            comments: Vec::new(),
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    short_id: Uuid,
    author_id: Uuid,
    kind: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = AppError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: row.id,
            author_id: row.author_id,
            kind: row.kind.parse().map_err(|e| corrupt("comment", e))?,
            body: row.body,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_source_channel(&self, channel: &SourceChannel) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO source_channels (id, channel_id, name, content_type, profile_image, video_count, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(channel.id)
        .bind(&channel.channel_id)
        .bind(&channel.name)
        .bind(channel.content_type.as_str())
        .bind(&channel.profile_image)
        .bind(channel.video_count)
        .bind(channel.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(_) => AppError::Conflict(format!(
                "Source channel {} already exists",
                channel.channel_id
            )),
            None => db_error(e, "Failed to insert source channel"),
        })?;
        Ok(())
    }

    async fn source_channel(&self, id: Uuid) -> Result<Option<SourceChannel>, AppError> {
        sqlx::query_as::<_, SourceChannelRow>(
            r#"SELECT id, channel_id, name, content_type, profile_image, video_count, created_at
               FROM source_channels WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch source channel"))?
        .map(SourceChannel::try_from)
        .transpose()
    }

    async fn list_source_channels(&self) -> Result<Vec<SourceChannel>, AppError> {
        sqlx::query_as::<_, SourceChannelRow>(
            r#"SELECT id, channel_id, name, content_type, profile_image, video_count, created_at
               FROM source_channels ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to list source channels"))?
        .into_iter()
        .map(SourceChannel::try_from)
        .collect()
    }

    async fn set_video_count(&self, id: Uuid, video_count: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE source_channels SET video_count = $2 WHERE id = $1")
            .bind(id)
            .bind(video_count)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Failed to update video count"))?;
        Ok(())
    }

    async fn delete_source_channel(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM source_channels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Failed to delete source channel"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_admin_channel(&self, channel: &AdminChannel) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO admin_channels (id, channel_id, name, content_type, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(channel.id)
        .bind(&channel.channel_id)
        .bind(&channel.name)
        .bind(channel.content_type.as_str())
        .bind(channel.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(_) => AppError::Conflict(format!(
                "Publication channel {} already exists",
                channel.channel_id
            )),
            None => db_error(e, "Failed to insert admin channel"),
        })?;
        Ok(())
    }

    async fn admin_channel(&self, id: Uuid) -> Result<Option<AdminChannel>, AppError> {
        sqlx::query_as::<_, AdminChannelRow>(
            r#"SELECT a.id, a.channel_id, a.name, a.content_type, a.created_at,
                      COUNT(s.id) AS published_count, MAX(s.published_at) AS last_published_at
               FROM admin_channels a
               LEFT JOIN shorts s ON s.target_channel_id = a.id AND s.status = 'PUBLISHED'
               WHERE a.id = $1
               GROUP BY a.id"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch admin channel"))?
        .map(AdminChannel::try_from)
        .transpose()
    }

    async fn list_admin_channels(&self) -> Result<Vec<AdminChannel>, AppError> {
        sqlx::query_as::<_, AdminChannelRow>(
            r#"SELECT a.id, a.channel_id, a.name, a.content_type, a.created_at,
                      COUNT(s.id) AS published_count, MAX(s.published_at) AS last_published_at
               FROM admin_channels a
               LEFT JOIN shorts s ON s.target_channel_id = a.id AND s.status = 'PUBLISHED'
               GROUP BY a.id
               ORDER BY a.name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to list admin channels"))?
        .into_iter()
        .map(AdminChannel::try_from)
        .collect()
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO users (id, username, role, status, assistant_of, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.assistant_of)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(_) => AppError::Conflict(format!("Username {} is already taken", user.username)),
            None => db_error(e, "Failed to insert user"),
        })?;
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, role, status, assistant_of, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch user"))?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, role, status, assistant_of, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to list users"))?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, role = $3, status = $4, assistant_of = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.assistant_of)
        .execute(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some(ONE_ASSISTANT_INDEX) => {
                AppError::Conflict("This videaste already has an assistant".to_string())
            }
            Some(_) => AppError::Conflict(format!("Username {} is already taken", user.username)),
            None => db_error(e, "Failed to update user"),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user.id)));
        }
        Ok(())
    }

    async fn assistant_of(&self, videaste_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, role, status, assistant_of, created_at
               FROM users WHERE assistant_of = $1 AND role = 'ASSISTANT'"#,
        )
        .bind(videaste_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch assistant"))?
        .map(User::try_from)
        .transpose()
    }

    async fn short(&self, id: Uuid) -> Result<Option<Short>, AppError> {
        let row = sqlx::query_as::<_, ShortRow>(&format!(
            "SELECT {} FROM shorts WHERE id = $1",
            SHORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch short"))?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_shorts(&self, filter: &ShortFilter) -> Result<Vec<Short>, AppError> {
        let rows = sqlx::query_as::<_, ShortRow>(&format!(
            r#"SELECT {} FROM shorts
               WHERE ($1::text IS NULL OR status = $1)
                 AND ($2::uuid IS NULL OR assigned_to = $2)
                 AND ($3::uuid IS NULL OR source_channel_id = $3)
                 AND ($4::uuid IS NULL OR target_channel_id = $4)
               ORDER BY rolled_at"#,
            SHORT_COLUMNS
        ))
        .bind(filter.status.map(ShortStatus::as_str))
        .bind(filter.assigned_to)
        .bind(filter.source_channel_id)
        .bind(filter.target_channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to list shorts"))?;

        self.hydrate(rows).await
    }

    async fn claimed_videos(&self, source_channel_id: Uuid) -> Result<HashSet<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"SELECT video_id FROM shorts
               WHERE source_channel_id = $1 AND status NOT IN ('ROLLED', 'REJECTED')"#,
        )
        .bind(source_channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to fetch claimed videos"))?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_rolled_short(&self, short: &Short) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query(
            r#"INSERT INTO shorts (id, source_channel_id, video_id, video_url, video_title, title, status, rolled_at, updated_at)
               SELECT $1::uuid, $2::uuid, $3::text, $4::text, $5::text, $6::text, $7::text, $8::timestamptz, $9::timestamptz
               WHERE NOT EXISTS (
                   SELECT 1 FROM shorts
                   WHERE source_channel_id = $2 AND video_id = $3
                     AND status NOT IN ('ROLLED', 'REJECTED')
               )"#,
        )
        .bind(short.id)
        .bind(short.source_channel_id)
        .bind(&short.video.video_id)
        .bind(&short.video.url)
        .bind(&short.video.title)
        .bind(&short.title)
        .bind(short.status.as_str())
        .bind(short.rolled_at)
        .bind(short.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(InsertOutcome::VideoClaimed),
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_foreign_key_violation(&e) => Err(AppError::NotFound(format!(
                "Source channel {} not found",
                short.source_channel_id
            ))),
            Err(e) => Err(db_error(e, "Failed to insert rolled short")),
        }
    }

    #[tracing::instrument(name = "Compare-and-set short", skip(self, short), fields(short_id = %short.id, to = %short.status))]
    async fn update_short(
        &self,
        short: &Short,
        expected: ShortStatus,
    ) -> Result<UpdateOutcome, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e, "Failed to open transaction"))?;

        let result = sqlx::query(
            r#"UPDATE shorts SET
                   title = $3, status = $4, assigned_to = $5, target_channel_id = $6,
                   deadline = $7, artifact_url = $8, completed_at = $9, validated_at = $10,
                   published_at = $11, updated_at = $12
               WHERE id = $1 AND status = $2"#,
        )
        .bind(short.id)
        .bind(expected.as_str())
        .bind(&short.title)
        .bind(short.status.as_str())
        .bind(short.assigned_to)
        .bind(short.target_channel_id)
        .bind(short.deadline)
        .bind(&short.artifact_url)
        .bind(short.completed_at)
        .bind(short.validated_at)
        .bind(short.published_at)
        .bind(short.updated_at)
        .execute(&mut *tx)
        .await;

        let updated = match result {
            Ok(done) => done.rows_affected(),
            Err(e) if violated_constraint(&e).as_deref() == Some(CLAIMED_VIDEO_INDEX) => {
                tx.rollback()
                    .await
                    .map_err(|e| db_error(e, "Failed to roll back"))?;
                return Ok(UpdateOutcome::VideoClaimed);
            }
            Err(e) => return Err(db_error(e, "Failed to update short")),
        };

        if updated == 0 {
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shorts WHERE id = $1")
                .bind(short.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| db_error(e, "Failed to check short"))?;
            tx.rollback()
                .await
                .map_err(|e| db_error(e, "Failed to roll back"))?;
            return if exists == 0 {
                Err(AppError::NotFound(format!("Short {} not found", short.id)))
            } else {
                Ok(UpdateOutcome::StatusChanged)
            };
        }

        for comment in &short.comments {
            sqlx::query(
                r#"INSERT INTO short_comments (id, short_id, author_id, kind, body, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6)
                   ON CONFLICT (id) DO NOTHING"#,
            )
            .bind(comment.id)
            .bind(short.id)
            .bind(comment.author_id)
            .bind(comment.kind.as_str())
            .bind(&comment.body)
            .bind(comment.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to insert comment"))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error(e, "Failed to commit short update"))?;
        Ok(UpdateOutcome::Applied)
    }

    async fn add_comment(&self, short_id: Uuid, comment: &Comment) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"INSERT INTO short_comments (id, short_id, author_id, kind, body, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(comment.id)
        .bind(short_id)
        .bind(comment.author_id)
        .bind(comment.kind.as_str())
        .bind(&comment.body)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_foreign_key_violation(&e) => Ok(false),
            Err(e) => Err(db_error(e, "Failed to insert comment")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentType, Role, UserStatus};
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    /// Database error stand-in carrying only a kind and a constraint name.
    #[derive(Debug)]
    struct ConstraintError {
        unique: bool,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint {:?} violated", self.constraint)
        }
    }

    impl std::error::Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(if self.unique { "23505" } else { "23503" }))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    fn db_err(unique: bool, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError { unique, constraint }))
    }

    fn short_row(status: &str) -> ShortRow {
        let now = Utc::now();
        ShortRow {
            id: Uuid::new_v4(),
            source_channel_id: Uuid::new_v4(),
            video_id: "abc".to_string(),
            video_url: "https://www.youtube.com/shorts/abc".to_string(),
            video_title: Some("Clip".to_string()),
            title: None,
            status: status.to_string(),
            rolled_at: now,
            assigned_to: None,
            target_channel_id: None,
            deadline: None,
            artifact_url: None,
            completed_at: None,
            validated_at: None,
            published_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn unique_violations_report_their_constraint() {
        let claimed = db_err(true, Some(CLAIMED_VIDEO_INDEX));
        assert_eq!(violated_constraint(&claimed).as_deref(), Some(CLAIMED_VIDEO_INDEX));
        assert!(!is_foreign_key_violation(&claimed));

        let unnamed = db_err(true, None);
        assert_eq!(violated_constraint(&unnamed).as_deref(), Some(""));

        let foreign = db_err(false, Some("shorts_source_channel_id_fkey"));
        assert!(violated_constraint(&foreign).is_none());
        assert!(is_foreign_key_violation(&foreign));

        assert!(violated_constraint(&sqlx::Error::RowNotFound).is_none());
    }

    #[test]
    fn missing_rows_are_not_found_and_the_rest_are_database_errors() {
        assert_eq!(db_error(sqlx::Error::RowNotFound, "lookup").kind(), "NotFound");
        let err = db_error(db_err(true, Some(ONE_ASSISTANT_INDEX)), "Failed to update user");
        assert_eq!(err.kind(), "Database");
        assert!(err.to_string().contains("Failed to update user"));
    }

    #[test]
    fn short_rows_map_onto_shorts() {
        let row = short_row("IN_PROGRESS");
        let id = row.id;
        let short = Short::try_from(row).unwrap();
        assert_eq!(short.id, id);
        assert_eq!(short.status, ShortStatus::InProgress);
        assert_eq!(short.video.video_id, "abc");
        assert_eq!(short.video.title.as_deref(), Some("Clip"));
        assert!(short.comments.is_empty());
    }

    #[test]
    fn unknown_enum_strings_surface_as_corrupt_rows() {
        let err = Short::try_from(short_row("PAUSED")).unwrap_err();
        assert_eq!(err.kind(), "Database");
        assert!(err.to_string().contains("Corrupt short row"));

        let now = Utc::now();
        let user = User::try_from(UserRow {
            id: Uuid::new_v4(),
            username: "a1".to_string(),
            role: "ASSISTANT".to_string(),
            status: "BLOCKED".to_string(),
            assistant_of: None,
            created_at: now,
        })
        .unwrap();
        assert_eq!(user.role, Role::Assistant);
        assert_eq!(user.status, UserStatus::Blocked);

        let err = User::try_from(UserRow {
            id: Uuid::new_v4(),
            username: "x".to_string(),
            role: "OWNER".to_string(),
            status: "ACTIVE".to_string(),
            assistant_of: None,
            created_at: now,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Corrupt user row"));

        let err = SourceChannel::try_from(SourceChannelRow {
            id: Uuid::new_v4(),
            channel_id: "UCx".to_string(),
            name: "x".to_string(),
            content_type: "VX_SANS_EDIT".to_string(),
            profile_image: None,
            video_count: 0,
            created_at: now,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Corrupt source channel row"));
    }

    #[test]
    fn admin_channel_rows_carry_publish_stats() {
        let now = Utc::now();
        let channel = AdminChannel::try_from(AdminChannelRow {
            id: Uuid::new_v4(),
            channel_id: "UCt".to_string(),
            name: "Target".to_string(),
            content_type: "VF_AVEC_EDIT".to_string(),
            created_at: now,
            published_count: 3,
            last_published_at: Some(now),
        })
        .unwrap();
        assert_eq!(channel.content_type, ContentType::VfAvecEdit);
        assert_eq!(channel.stats.published_count, 3);
        assert_eq!(channel.stats.last_published_at, Some(now));
    }
}
