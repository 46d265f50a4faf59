use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180004_create_lessons"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("lessons"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).string().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("module_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("title")).string().not_null())
                    .col(ColumnDef::new(Alias::new("description")).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Alias::new("lesson_type"))
                            .enumeration(
                                Alias::new("lesson_type_enum"),
                                vec![
                                    Alias::new("TEXT"),
                                    Alias::new("VIDEO"),
                                    Alias::new("AUDIO"),
                                    Alias::new("QUIZ"),
                                    Alias::new("INTERACTIVE"),
                                    Alias::new("ASSIGNMENT"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("duration")).integer().null())
                    .col(ColumnDef::new(Alias::new("content")).text().not_null().default(""))
                    .col(ColumnDef::new(Alias::new("position")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("is_published")).boolean().not_null().default(false))
                    .col(ColumnDef::new(Alias::new("version")).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("lessons"), Alias::new("module_id"))
                            .to(Alias::new("modules"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lessons_module_position")
                    .if_not_exists()
                    .table(Alias::new("lessons"))
                    .col(Alias::new("module_id"))
                    .col(Alias::new("position"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("lessons")).to_owned())
            .await
    }
}
