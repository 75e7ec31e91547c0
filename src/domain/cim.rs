use crate::soap::{Ns, SoapValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `CimExportOptions` of the CGMES export.
///
/// Fields are serialized in data-contract (alphabetical) order, which the
/// service requires. `boundary_path` may name a local zip; the service layer
/// uploads it and replaces the value with the server-side path before export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CimExportOptions {
    pub areas_to_export: Vec<String>,
    pub areas_to_export_names: Vec<String>,
    pub baltic_cgm_area: Option<String>,
    pub baltic_rsc_export: bool,
    pub boundary_area_name: String,
    pub boundary_path: Option<String>,
    pub description: String,
    pub dynamic_line_rating_path: Option<String>,
    pub entsoe_zip: bool,
    pub eq_file_cim_id: Option<String>,
    pub exclude_brell: bool,
    pub export_as_cgmes3: bool,
    pub export_boundary: bool,
    pub export_dl: bool,
    pub export_dy: bool,
    pub export_eq: bool,
    pub export_gl: bool,
    pub export_merged: bool,
    pub export_ssh: bool,
    pub export_sv: bool,
    pub export_sv_short_circuit: bool,
    pub export_tp: bool,
    pub file_header_comment: String,
    pub is_automated_export: bool,
    pub keep_eq_id_constant: bool,
    /// Per model authority set, the areas whose SV is exported.
    pub list_of_mas_for_sv_export: Vec<(String, Vec<String>)>,
    pub mas: String,
    pub period: String,
    pub scenario_date_time: DateTime<Utc>,
    pub version: String,
}

impl Default for CimExportOptions {
    fn default() -> Self {
        Self {
            areas_to_export: Vec::new(),
            areas_to_export_names: Vec::new(),
            baltic_cgm_area: None,
            baltic_rsc_export: false,
            boundary_area_name: "EU".to_string(),
            boundary_path: None,
            description: "Neplan Export".to_string(),
            dynamic_line_rating_path: None,
            entsoe_zip: true,
            eq_file_cim_id: None,
            exclude_brell: true,
            export_as_cgmes3: false,
            export_boundary: false,
            export_dl: false,
            export_dy: false,
            export_eq: true,
            export_gl: false,
            export_merged: false,
            export_ssh: true,
            export_sv: true,
            export_sv_short_circuit: false,
            export_tp: true,
            file_header_comment: "OPDE Confidential".to_string(),
            is_automated_export: true,
            keep_eq_id_constant: true,
            list_of_mas_for_sv_export: Vec::new(),
            mas: String::new(),
            period: "1D".to_string(),
            scenario_date_time: Utc::now(),
            version: "001".to_string(),
        }
    }
}

impl CimExportOptions {
    pub fn to_soap(&self) -> SoapValue {
        let guids = SoapValue::Array {
            item: "guid".to_string(),
            items: self
                .areas_to_export
                .iter()
                .map(|g| SoapValue::Text(g.clone()))
                .collect(),
        };
        let mas_areas = SoapValue::Array {
            item: "KeyValueOfstringArrayOfstringty7Ep6D1".to_string(),
            items: self
                .list_of_mas_for_sv_export
                .iter()
                .map(|(mas, areas)| SoapValue::Struct {
                    ns: Ns::Arrays,
                    fields: vec![
                        ("Key".to_string(), SoapValue::Text(mas.clone())),
                        ("Value".to_string(), SoapValue::strings(areas.iter().cloned())),
                    ],
                })
                .collect(),
        };

        let fields: Vec<(&str, SoapValue)> = vec![
            ("AreasToExport", guids),
            (
                "AreasToExportNames",
                SoapValue::strings(self.areas_to_export_names.iter().cloned()),
            ),
            ("BalticCGMArea", self.baltic_cgm_area.clone().into()),
            ("BalticRSCExport", self.baltic_rsc_export.into()),
            ("BoundaryAreaName", self.boundary_area_name.clone().into()),
            ("BoundaryPath", self.boundary_path.clone().into()),
            ("Description", self.description.clone().into()),
            ("DynamicLineRatingPath", self.dynamic_line_rating_path.clone().into()),
            ("ENTSOEZIP", self.entsoe_zip.into()),
            ("EqFileCIMID", self.eq_file_cim_id.clone().into()),
            ("ExcludeBRELL", self.exclude_brell.into()),
            ("ExportAsCGMES3", self.export_as_cgmes3.into()),
            ("ExportBoundary", self.export_boundary.into()),
            ("ExportDL", self.export_dl.into()),
            ("ExportDY", self.export_dy.into()),
            ("ExportEQ", self.export_eq.into()),
            ("ExportGL", self.export_gl.into()),
            ("ExportMerged", self.export_merged.into()),
            ("ExportSSH", self.export_ssh.into()),
            ("ExportSV", self.export_sv.into()),
            ("ExportSVShortCircuit", self.export_sv_short_circuit.into()),
            ("ExportTP", self.export_tp.into()),
            ("FileHeaderComment", self.file_header_comment.clone().into()),
            ("IsAutomatedExport", self.is_automated_export.into()),
            ("KeepEQIDConstant", self.keep_eq_id_constant.into()),
            ("ListOfMASForSVExport", mas_areas),
            ("MAS", self.mas.clone().into()),
            ("Period", self.period.clone().into()),
            ("ScenarioDateTime", self.scenario_date_time.into()),
            ("Version", self.version.clone().into()),
        ];

        SoapValue::Struct {
            ns: Ns::Data,
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_export_core_profiles_as_entsoe_zip() {
        let options = CimExportOptions::default();
        assert!(options.entsoe_zip);
        assert!(options.export_eq && options.export_ssh && options.export_tp && options.export_sv);
        assert!(!options.export_merged);
        assert_eq!(options.boundary_area_name, "EU");
        assert_eq!(options.period, "1D");
        assert_eq!(options.version, "001");
    }

    #[test]
    fn fields_are_alphabetical_and_complete() {
        let options = CimExportOptions {
            areas_to_export_names: vec!["Estonia".to_string()],
            list_of_mas_for_sv_export: vec![(
                "http://www.elering.ee/OperationalPlanning".to_string(),
                vec!["EE".to_string()],
            )],
            ..Default::default()
        };

        let SoapValue::Struct { ns, fields } = options.to_soap() else {
            panic!("options must serialize as a struct");
        };
        assert_eq!(ns, Ns::Data);
        assert_eq!(fields.len(), 30);

        let names: Vec<String> = fields.iter().map(|(n, _)| n.to_lowercase()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let boundary = fields.iter().find(|(n, _)| n == "BoundaryPath").unwrap();
        assert_eq!(boundary.1, SoapValue::Nil);
    }
}
