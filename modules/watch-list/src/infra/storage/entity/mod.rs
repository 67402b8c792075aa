/// `ActiveModelBehavior` for entities with a UUID `id` and `created_at`/`updated_at`.
///
/// New active models get a fresh v4 id; saves stamp `updated_at`, inserts
/// also stamp `created_at`.
macro_rules! timestamped_behavior {
    () => {
        #[async_trait::async_trait]
        impl ActiveModelBehavior for ActiveModel {
            fn new() -> Self {
                Self {
                    id: sea_orm::ActiveValue::Set(uuid::Uuid::new_v4()),
                    ..<Self as sea_orm::ActiveModelTrait>::default()
                }
            }

            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
            where
                C: ConnectionTrait,
            {
                let now = chrono::Utc::now();
                if insert {
                    self.created_at = sea_orm::ActiveValue::Set(now);
                }
                self.updated_at = sea_orm::ActiveValue::Set(now);
                Ok(self)
            }
        }
    };
}

pub(crate) use timestamped_behavior;

pub mod admin;
pub mod anime;
pub mod kinopoisk;
pub mod user;
