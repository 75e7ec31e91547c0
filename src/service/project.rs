use crate::domain::catalog::ElementKind;
use crate::domain::model::{ElementTable, KeyValueTable, ProjectRef};
use crate::domain::ports::RemoteGateway;
use crate::service::NeplanService;
use crate::soap::{Param, SoapValue, XmlNode};
use crate::utils::error::{NeplanError, Result};
use std::collections::BTreeMap;

impl<G: RemoteGateway> NeplanService<G> {
    /// `GetProject`. `Ok(None)` when the service knows no such project.
    pub async fn get_project(
        &self,
        project_name: &str,
        variant_name: &str,
        diagram_name: &str,
        layer_name: &str,
    ) -> Result<Option<ProjectRef>> {
        tracing::debug!("Getting project: {}", project_name);
        let result = self
            .invoke_result(
                "GetProject",
                vec![
                    Param::new("projectName", project_name),
                    Param::new("variantName", variant_name),
                    Param::new("diagramName", diagram_name),
                    Param::new("layerName", layer_name),
                ],
            )
            .await?;

        let project = result.as_ref().and_then(ProjectRef::from_node);
        if project.is_none() {
            tracing::error!(
                "Project not found: name='{}' variant='{}' diagram='{}' layer='{}'",
                project_name,
                variant_name,
                diagram_name,
                layer_name
            );
        }
        Ok(project)
    }

    /// Project by name in its default variant, diagram and layer.
    pub async fn resolve_project(&self, project_name: &str) -> Result<Option<ProjectRef>> {
        self.get_project(project_name, "", "", "").await
    }

    pub async fn get_projects(&self) -> Result<Vec<ProjectRef>> {
        tracing::debug!("Getting all projects");
        let result = self.invoke_result("GetProjects", vec![]).await?;
        if result.is_none() {
            tracing::error!("GetProjects returned nothing");
        }
        Ok(result
            .map(|list| list.children.iter().filter_map(ProjectRef::from_node).collect())
            .unwrap_or_default())
    }

    pub async fn get_all_feeders(&self, project: &ProjectRef) -> Result<Vec<XmlNode>> {
        self.project_listing("GetAllFeeders", project).await
    }

    pub async fn get_all_subareas(&self, project: &ProjectRef) -> Result<Vec<XmlNode>> {
        self.project_listing("GetAllSubAreas", project).await
    }

    pub async fn get_all_zones(&self, project: &ProjectRef) -> Result<Vec<XmlNode>> {
        self.project_listing("GetAllZones", project).await
    }

    async fn project_listing(&self, operation: &str, project: &ProjectRef) -> Result<Vec<XmlNode>> {
        let result = self
            .invoke_result(operation, vec![Param::new("project", project.to_soap())])
            .await?;
        Ok(result.map(|list| list.children).unwrap_or_default())
    }

    /// Every element of the project with its name and type.
    pub async fn get_all_elements_of_project(&self, project: &ProjectRef) -> Result<ElementTable> {
        let response = self
            .invoke(
                "GetAllElementsOfProject",
                vec![
                    Param::new("project", project.to_soap()),
                    Param::new("elementNames", SoapValue::empty_dictionary()),
                    Param::new("elementTypes", SoapValue::empty_dictionary()),
                ],
            )
            .await?;

        let table_of = |name: &str| {
            response
                .child(name)
                .map(KeyValueTable::from_node)
                .ok_or_else(|| NeplanError::unexpected("GetAllElementsOfProject", format!("missing {}", name)))
        };
        let names = table_of("elementNames")?;
        let types = table_of("elementTypes")?;

        let table = ElementTable::join(&names, &types);
        tracing::info!("{} elements in project {}", table.len(), project);
        Ok(table)
    }

    /// Elements of one type; output dictionaries keyed by their parameter name.
    pub async fn get_all_elements_of_element_type(
        &self,
        project: &ProjectRef,
        element_type: ElementKind,
    ) -> Result<BTreeMap<String, KeyValueTable>> {
        let response = self
            .invoke(
                "GetAllElementsOfElementType",
                vec![
                    Param::new("project", project.to_soap()),
                    Param::new("elementType", element_type.as_str()),
                    Param::new("elementIDs", SoapValue::empty_dictionary()),
                    Param::new("elementNames", SoapValue::empty_dictionary()),
                ],
            )
            .await?;

        Ok(response
            .children
            .iter()
            .filter(|c| !c.name.ends_with("Result"))
            .map(|c| (c.name.clone(), KeyValueTable::from_node(c)))
            .collect())
    }

    pub async fn get_subarea_id_by_name(&self, project: &ProjectRef, name: &str) -> Result<Option<String>> {
        self.invoke_text(
            "GetSubAreaIDByName",
            vec![Param::new("project", project.to_soap()), Param::new("subAreaName", name)],
        )
        .await
    }

    pub async fn get_subarea_name_by_id(&self, project: &ProjectRef, id: &str) -> Result<Option<String>> {
        self.invoke_text(
            "GetSubAreaNameByID",
            vec![Param::new("project", project.to_soap()), Param::new("subAreaID", id)],
        )
        .await
    }

    pub async fn get_zone_id_by_name(&self, project: &ProjectRef, name: &str) -> Result<Option<String>> {
        self.invoke_text(
            "GetZoneIDByName",
            vec![Param::new("project", project.to_soap()), Param::new("zoneName", name)],
        )
        .await
    }

    pub async fn get_zone_name_by_id(&self, project: &ProjectRef, id: &str) -> Result<Option<String>> {
        self.invoke_text(
            "GetZoneNameByID",
            vec![Param::new("project", project.to_soap()), Param::new("zoneID", id)],
        )
        .await
    }

    /// Purges the caller's projects marked as deleted (all of them for an admin).
    pub async fn delete_marked_as_deleted_projects(&self) -> Result<u64> {
        let count = self
            .invoke_required_text("DeleteMarkedAdDeletedProject", vec![])
            .await?;
        count.trim().parse().map_err(|_| {
            NeplanError::unexpected("DeleteMarkedAdDeletedProject", format!("not a count: '{}'", count))
        })
    }
}
