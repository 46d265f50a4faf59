use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180002_create_courses"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("courses"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).string().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("title")).string().not_null())
                    .col(ColumnDef::new(Alias::new("description")).text().not_null().default(""))
                    .col(ColumnDef::new(Alias::new("duration")).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Alias::new("level"))
                            .enumeration(
                                Alias::new("course_level_type"),
                                vec![
                                    Alias::new("beginner"),
                                    Alias::new("intermediate"),
                                    Alias::new("advanced"),
                                    Alias::new("expert"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("tags")).json().not_null())
                    .col(ColumnDef::new(Alias::new("teacher_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("version")).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("courses"), Alias::new("teacher_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("courses")).to_owned())
            .await
    }
}
