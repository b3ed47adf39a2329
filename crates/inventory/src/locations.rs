//! Server location discovery
//!
//! Scans the object catalog for the well-known marker data areas:
//! `AFSVERSION` anchors an AFS wrapper library, `JETTYHOME` a Jetty one.

use afsctl_errors::{Error, InventoryError};
use afsctl_gateway::RemoteGateway;
use afsctl_types::{LibraryName, ServerKind, ServerLocation};

use crate::row;

const QUERY: &str = "\
Select OBJLIB, IASP_NUMBER, DATA_AREA_VALUE, 'AFS' as TYPE \
From Table(QSYS2.OBJECT_STATISTICS('*ALL','*DTAARA','AFSVERSION')) \
Cross Join Table(QSYS2.DATA_AREA_INFO( DATA_AREA_NAME => OBJNAME, DATA_AREA_LIBRARY => OBJLIB)) \
Union \
Select OBJLIB, IASP_NUMBER, DATA_AREA_VALUE, 'Jetty' as TYPE \
From Table(QSYS2.OBJECT_STATISTICS('*ALL','*DTAARA','JETTYHOME')) \
Cross Join Table(QSYS2.DATA_AREA_INFO( DATA_AREA_NAME => OBJNAME, DATA_AREA_LIBRARY => OBJLIB)) \
Order by TYPE, OBJLIB";

/// List every AFS and Jetty product location on the host.
///
/// # Errors
///
/// Returns an error if the catalog query fails or returns malformed rows.
pub async fn find_locations(gateway: &dyn RemoteGateway) -> Result<Vec<ServerLocation>, Error> {
    let rows = gateway.run_sql(QUERY).await?;
    let mut locations = Vec::with_capacity(rows.len());
    for row in rows {
        let library = row::text(&row, "locations", "OBJLIB")?;
        let kind = match row::text(&row, "locations", "TYPE")?.as_str() {
            "AFS" => ServerKind::Afs,
            "Jetty" => ServerKind::Jetty,
            other => {
                return Err(InventoryError::BadColumn {
                    column: "TYPE",
                    value: other.to_string(),
                }
                .into())
            }
        };
        locations.push(ServerLocation {
            library: LibraryName::new(&library)?,
            data_area_value: row::text(&row, "locations", "DATA_AREA_VALUE")?,
            iasp: row::opt_number(&row, "IASP_NUMBER")
                .filter(|n| *n > 0)
                .and_then(|n| u16::try_from(n).ok()),
            kind,
        });
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use afsctl_gateway::testing::ScriptedGateway;
    use serde_json::json;

    fn rows(values: serde_json::Value) -> Vec<afsctl_gateway::SqlRow> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn maps_catalog_rows_to_locations() {
        let gateway = ScriptedGateway::new();
        gateway.respond_sql(
            "OBJECT_STATISTICS",
            rows(json!([
                {"OBJLIB": "AFSLIB    ", "IASP_NUMBER": 0, "DATA_AREA_VALUE": "24.0.1 ", "TYPE": "AFS"},
                {"OBJLIB": "JETTY", "IASP_NUMBER": "33", "DATA_AREA_VALUE": "/opt/jetty", "TYPE": "Jetty"}
            ])),
        );

        let locations = find_locations(&gateway).await.unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].library.as_str(), "AFSLIB");
        assert_eq!(locations[0].kind, ServerKind::Afs);
        assert_eq!(locations[0].iasp, None);
        assert_eq!(locations[0].data_area_value, "24.0.1");
        assert_eq!(locations[1].kind, ServerKind::Jetty);
        assert_eq!(locations[1].iasp, Some(33));
    }

    #[tokio::test]
    async fn unknown_location_type_is_rejected() {
        let gateway = ScriptedGateway::new();
        gateway.respond_sql(
            "OBJECT_STATISTICS",
            rows(json!([
                {"OBJLIB": "X", "IASP_NUMBER": 0, "DATA_AREA_VALUE": "", "TYPE": "Tomcat"}
            ])),
        );
        assert!(find_locations(&gateway).await.is_err());
    }
}
