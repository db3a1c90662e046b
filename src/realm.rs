//! Realm record access
//!
//! The realm record is the single `legion_auth`.`realmlist` row (`id = 1`)
//! holding the externally visible address, local address, client build and
//! port fields. Everything is fetched as text; the configs store raw
//! strings, so comparisons happen string-to-string with no coercion.

use sqlx::MySqlPool;

/// The four address/build/port fields of the realm row, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealmFields {
    pub address: String,
    pub local_address: String,
    pub build: String,
    pub port: String,
    pub game_port: String,
}

/// Fetch the realm row. A missing row surfaces as `RowNotFound`; callers
/// treat any failure here as the data source being unavailable for the
/// affected checks.
pub async fn fetch_realm(pool: &MySqlPool) -> Result<RealmFields, sqlx::Error> {
    let (address, local_address, build, port, game_port): (String, String, String, String, String) =
        sqlx::query_as(
            "SELECT `address`, `localAddress`, CAST(`gamebuild` AS CHAR), \
             CAST(`port` AS CHAR), CAST(`gamePort` AS CHAR) \
             FROM `legion_auth`.`realmlist` WHERE `id` = 1",
        )
        .fetch_one(pool)
        .await?;

    Ok(RealmFields {
        address,
        local_address,
        build,
        port,
        game_port,
    })
}

/// Push the gateway config's external address and build into the realm row.
/// This is the only write the tool performs against the database.
pub async fn update_realm(
    pool: &MySqlPool,
    address: &str,
    build: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE `legion_auth`.`realmlist` SET `address` = ?, `gamebuild` = ? WHERE `id` = 1",
    )
    .bind(address)
    .bind(build)
    .execute(pool)
    .await?;
    tracing::info!("[realm] realmlist updated: address={} build={}", address, build);
    Ok(())
}

#[cfg(test)]
mod tests {
    // Realm queries need a live legion_auth database; exercised manually
    // against a running deployment. Pattern matches the rest of the crate's
    // pure-logic tests staying hermetic.
}
