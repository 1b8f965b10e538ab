use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, json};
use crate::{
    error::Result,
    types::{DetectionItem, DetectionResult},
};

impl DetectionItem {
    /// The item as a GeoJSON feature in original-image pixel coordinates.
    pub fn to_feature(&self) -> Result<Feature> {
        let mut ring: Vec<Vec<f64>> = self.polygon.iter().map(|p| vec![p.x, p.y]).collect();
        if let Some(first) = ring.first().cloned() {
            if ring.last() != Some(&first) {
                ring.push(first);
            }
        }

        let mut properties = Map::new();
        properties.insert("area".to_string(), json!(self.area));
        properties.insert("touchesEdge".to_string(), json!(self.touches_edge));
        properties.insert("bbox".to_string(), serde_json::to_value(self.bbox)?);
        properties.insert("rbox".to_string(), serde_json::to_value(self.rbox)?);

        Ok(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

impl DetectionResult {
    /// Export to a feature collection holding zero or one feature
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let features = self
            .item
            .as_ref()
            .map(DetectionItem::to_feature)
            .transpose()?
            .into_iter()
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("imageWidth".to_string(), json!(self.width));
        foreign_members.insert("imageHeight".to_string(), json!(self.height));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson()?)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}
