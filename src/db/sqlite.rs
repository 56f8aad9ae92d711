use crate::db::models::{
    Counter, Device, ModuleData, NewModule, RegisteredDevice, RegisteredModule,
    SESSION_TTL_MILLIS, Session, User, UserDevice,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::RelayError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Handle to the device registry. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct RegistryStore {
    pool: SqlitePool,
}

impl RegistryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`, creating the file if needed, and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, RelayError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let mut pool_opts = SqlitePoolOptions::new();
        // every in-memory connection is its own database
        if database_url.contains(":memory:") {
            pool_opts = pool_opts.max_connections(1);
        }
        let pool = pool_opts.connect_with(connect_opts).await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), RelayError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), RelayError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // --- users ---

    pub async fn create_user(
        &self,
        email: Option<&str>,
        pw: Option<&str>,
        devices: &[UserDevice],
    ) -> Result<i64, RelayError> {
        let devices_json = serde_json::to_string(devices)?;
        let res = sqlx::query("INSERT INTO users (email, pw, devices) VALUES (?, ?, ?)")
            .bind(email)
            .bind(pw)
            .bind(devices_json)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RelayError> {
        let row = sqlx::query("SELECT id, email, pw, devices FROM users WHERE email = ? ORDER BY id")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn delete_users_by_email(&self, email: &str) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM users WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // --- device catalog ---

    pub async fn create_device(&self, device_type: Option<&str>) -> Result<i64, RelayError> {
        let res = sqlx::query("INSERT INTO devices (type) VALUES (?)")
            .bind(device_type)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, RelayError> {
        let rows = sqlx::query("SELECT id, type FROM devices ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| -> Result<Device, RelayError> {
                Ok(Device {
                    id: row.try_get("id")?,
                    device_type: row.try_get("type")?,
                })
            })
            .collect()
    }

    pub async fn delete_devices_by_type(&self, device_type: &str) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM devices WHERE type = ?")
            .bind(device_type)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // --- registered devices ---

    pub async fn create_registered_device(
        &self,
        device_type: Option<&str>,
        serial: Option<&str>,
        status: &Map<String, Value>,
    ) -> Result<i64, RelayError> {
        let status_json = serde_json::to_string(status)?;
        let res = sqlx::query(
            "INSERT INTO registered_devices (type, serial, status) VALUES (?, ?, ?)",
        )
        .bind(device_type)
        .bind(serial)
        .bind(status_json)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Serials are not unique; every match is returned in insertion order.
    pub async fn find_registered_devices_by_serial(
        &self,
        serial: &str,
    ) -> Result<Vec<RegisteredDevice>, RelayError> {
        let rows = sqlx::query(
            "SELECT id, type, serial, status FROM registered_devices WHERE serial = ? ORDER BY id",
        )
        .bind(serial)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| -> Result<RegisteredDevice, RelayError> {
                let status_json: String = row.try_get("status")?;
                Ok(RegisteredDevice {
                    id: row.try_get("id")?,
                    device_type: row.try_get("type")?,
                    serial: row.try_get("serial")?,
                    status: serde_json::from_str(&status_json)?,
                })
            })
            .collect()
    }

    pub async fn delete_registered_devices_by_serial(&self, serial: &str) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM registered_devices WHERE serial = ?")
            .bind(serial)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // --- sessions ---

    pub async fn create_session(&self, sid: &str, email: &str) -> Result<i64, RelayError> {
        self.create_session_at(sid, email, Utc::now()).await
    }

    /// `created_at` is stored with millisecond precision; sub-millisecond digits are dropped.
    pub async fn create_session_at(
        &self,
        sid: &str,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64, RelayError> {
        let res = sqlx::query("INSERT INTO sessions (sid, email, created_at) VALUES (?, ?, ?)")
            .bind(sid)
            .bind(email)
            .bind(created_at.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    /// Live session for `sid`. Expired rows are invisible even before the sweep removes them.
    pub async fn find_session(&self, sid: &str) -> Result<Option<Session>, RelayError> {
        self.find_session_at(sid, Utc::now()).await
    }

    pub async fn find_session_at(
        &self,
        sid: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RelayError> {
        let row = sqlx::query(
            r#"SELECT id, sid, email, created_at FROM sessions
               WHERE sid = ? AND created_at > ?
               ORDER BY id DESC"#,
        )
        .bind(sid)
        .bind(now.timestamp_millis() - SESSION_TTL_MILLIS)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_session).transpose()
    }

    /// Physically remove sessions whose TTL elapsed. Returns the number removed.
    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM sessions WHERE created_at <= ?")
            .bind(now.timestamp_millis() - SESSION_TTL_MILLIS)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_sessions_by_email(&self, email: &str) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM sessions WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // --- counters ---

    pub async fn create_counter(&self, name: &str) -> Result<i64, RelayError> {
        let now = Utc::now().to_rfc3339();
        let res =
            sqlx::query("INSERT INTO counters (name, created_at, updated_at) VALUES (?, ?, ?)")
                .bind(name)
                .bind(&now)
                .bind(&now)
                .execute(&self.pool)
                .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn find_counter(&self, name: &str) -> Result<Option<Counter>, RelayError> {
        let row = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM counters WHERE name = ? ORDER BY id",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| -> Result<Counter, RelayError> {
            let created_at: String = row.try_get("created_at")?;
            let updated_at: String = row.try_get("updated_at")?;
            Ok(Counter {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                created_at: parse_rfc3339(&created_at)?,
                updated_at: parse_rfc3339(&updated_at)?,
            })
        })
        .transpose()
    }

    pub async fn delete_counters_by_name(&self, name: &str) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM counters WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // --- registered modules ---

    pub async fn create_module(&self, module: NewModule) -> Result<i64, RelayError> {
        let data_json = serde_json::to_string(&module.data.to_value())?;
        let res = sqlx::query(
            r#"INSERT INTO registered_modules (serial, type_id, name, data, reservation)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(module.serial)
        .bind(module.type_id)
        .bind(module.name)
        .bind(data_json)
        .bind(module.reservation.map(|r| r.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn list_modules(&self) -> Result<Vec<RegisteredModule>, RelayError> {
        let rows = sqlx::query(
            r#"SELECT id, serial, type_id, name, data, reservation
               FROM registered_modules ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_module).collect()
    }

    pub async fn count_modules(&self) -> Result<i64, RelayError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registered_modules")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn delete_all_modules(&self) -> Result<u64, RelayError> {
        let res = sqlx::query("DELETE FROM registered_modules")
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    fn row_to_user(row: SqliteRow) -> Result<User, RelayError> {
        let devices_json: String = row.try_get("devices")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            pw: row.try_get("pw")?,
            devices: serde_json::from_str(&devices_json)?,
        })
    }

    fn row_to_session(row: SqliteRow) -> Result<Session, RelayError> {
        let created_at: i64 = row.try_get("created_at")?;
        let created_at = DateTime::from_timestamp_millis(created_at)
            .ok_or_else(|| sqlx::Error::Decode(format!("bad timestamp {created_at}").into()))?;
        Ok(Session {
            id: row.try_get("id")?,
            sid: row.try_get("sid")?,
            email: row.try_get("email")?,
            created_at,
        })
    }

    fn row_to_module(row: SqliteRow) -> Result<RegisteredModule, RelayError> {
        let type_id: i64 = row.try_get("type_id")?;
        let data_json: String = row.try_get("data")?;
        let reservation: Option<String> = row.try_get("reservation")?;
        Ok(RegisteredModule {
            id: row.try_get("id")?,
            serial: row.try_get("serial")?,
            type_id,
            name: row.try_get("name")?,
            data: ModuleData::from_value(type_id, serde_json::from_str(&data_json)?)?,
            reservation: reservation.as_deref().map(parse_rfc3339).transpose()?,
        })
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, RelayError> {
    let dt = DateTime::parse_from_rfc3339(s)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{FeederData, SESSION_TTL_SECS};
    use chrono::Duration;
    use serde_json::json;

    async fn memory_store() -> RegistryStore {
        RegistryStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn user_keeps_embedded_devices() {
        let store = memory_store().await;
        let devices = vec![UserDevice {
            device_type: Some(1),
            serial: Some("970121".into()),
        }];
        store
            .create_user(Some("a@b.c"), Some("pw"), &devices)
            .await
            .unwrap();

        let user = store.find_user_by_email("a@b.c").await.unwrap().unwrap();
        assert_eq!(user.devices, devices);
        assert_eq!(user.pw.as_deref(), Some("pw"));

        assert_eq!(store.delete_users_by_email("a@b.c").await.unwrap(), 1);
        assert!(store.find_user_by_email("a@b.c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn registered_device_serials_may_repeat() {
        let store = memory_store().await;
        let status = json!({"power": "on", "remain": 4}).as_object().unwrap().clone();
        store
            .create_registered_device(Some("feeder"), Some("970121"), &status)
            .await
            .unwrap();
        store
            .create_registered_device(Some("feeder"), Some("970121"), &Map::new())
            .await
            .unwrap();

        let found = store
            .find_registered_devices_by_serial("970121")
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].status, status);
        assert_eq!(
            store
                .delete_registered_devices_by_serial("970121")
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn device_catalog_create_list_delete() {
        let store = memory_store().await;
        store.create_device(Some("feeder")).await.unwrap();
        store.create_device(Some("water")).await.unwrap();
        assert_eq!(store.list_devices().await.unwrap().len(), 2);
        assert_eq!(store.delete_devices_by_type("feeder").await.unwrap(), 1);
        let left = store.list_devices().await.unwrap();
        assert_eq!(left[0].device_type.as_deref(), Some("water"));
    }

    #[tokio::test]
    async fn session_unreadable_after_ttl_and_purged() {
        let store = memory_store().await;
        let created = Utc::now() - Duration::seconds(10);
        store
            .create_session_at("sid-1", "a@b.c", created)
            .await
            .unwrap();

        let live = store
            .find_session_at("sid-1", created + Duration::seconds(3599))
            .await
            .unwrap();
        assert_eq!(live.unwrap().email.as_deref(), Some("a@b.c"));

        let expired_at = created + Duration::seconds(SESSION_TTL_SECS);
        assert!(
            store
                .find_session_at("sid-1", expired_at)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.purge_expired_sessions(expired_at).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn session_created_at_keeps_milliseconds() {
        let store = memory_store().await;
        let created = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        store
            .create_session_at("sid-ms", "a@b.c", created)
            .await
            .unwrap();

        let session = store
            .find_session_at("sid-ms", created + Duration::seconds(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.created_at, created);
        assert_eq!(session.expires_at(), created + Duration::seconds(SESSION_TTL_SECS));
        assert!(
            store
                .find_session_at("sid-ms", session.expires_at())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn purge_leaves_live_sessions() {
        let store = memory_store().await;
        store.create_session("fresh", "a@b.c").await.unwrap();
        assert_eq!(store.purge_expired_sessions(Utc::now()).await.unwrap(), 0);
        assert!(store.find_session("fresh").await.unwrap().is_some());
        assert_eq!(store.delete_sessions_by_email("a@b.c").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn counter_timestamps_roundtrip() {
        let store = memory_store().await;
        store.create_counter("modules").await.unwrap();
        let counter = store.find_counter("modules").await.unwrap().unwrap();
        assert_eq!(counter.created_at, counter.updated_at);
        assert_eq!(store.delete_counters_by_name("modules").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn module_data_is_read_back_typed() {
        let store = memory_store().await;
        let data = ModuleData::Feeder(FeederData {
            is_eaten: Some(false),
            time_eaten: None,
            num_eaten: Some(30),
        });
        store
            .create_module(NewModule {
                serial: "970121".into(),
                type_id: ModuleData::FEEDER_TYPE,
                name: "module1".into(),
                data: data.clone(),
                reservation: None,
            })
            .await
            .unwrap();

        let modules = store.list_modules().await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].data, data);
        assert_eq!(modules[0].reservation, None);
    }
}
