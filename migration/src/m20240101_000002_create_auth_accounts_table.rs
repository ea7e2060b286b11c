use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthAccounts::Uid)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthAccounts::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AuthAccounts::PasswordHash)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthAccounts::DisplayName)
                            .string_len(200),
                    )
                    .col(
                        ColumnDef::new(AuthAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AuthAccounts {
    Table,
    Uid,
    Email,
    PasswordHash,
    DisplayName,
    CreatedAt,
}
