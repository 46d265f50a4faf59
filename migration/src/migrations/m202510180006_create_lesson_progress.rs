use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180006_create_lesson_progress"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("lesson_progress"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).string().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("user_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("lesson_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("completed")).boolean().not_null().default(false))
                    .col(ColumnDef::new(Alias::new("score")).integer().null())
                    .col(ColumnDef::new(Alias::new("time_spent")).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("completed_at")).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp_with_time_zone().not_null())
                    .index(
                        Index::create()
                            .col(Alias::new("user_id"))
                            .col(Alias::new("lesson_id"))
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("lesson_progress"), Alias::new("user_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("lesson_progress"), Alias::new("lesson_id"))
                            .to(Alias::new("lessons"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("lesson_progress")).to_owned())
            .await
    }
}
