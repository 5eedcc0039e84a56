use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000000_create_events::Events;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventImages::Table)
                    .if_not_exists()
                    .col(pk_uuid(EventImages::Id))
                    .col(uuid(EventImages::EventId))
                    .col(integer(EventImages::Position))
                    .col(text(EventImages::Base64))
                    .col(text(EventImages::ImagePath))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_images_event_id")
                            .from(EventImages::Table, EventImages::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_images_event_id")
                    .table(EventImages::Table)
                    .col(EventImages::EventId)
                    .col(EventImages::Position)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventImages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventImages {
    Table,
    Id,
    EventId,
    Position,
    Base64,
    ImagePath,
}
