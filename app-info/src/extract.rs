use log::{debug, info};
use serde::Serialize;

use crate::{
    image::{find_matching_image, ImageReference},
    info::{parse_app_repository, parse_image_repository, InfoItem},
};

/// The git repository of an application and the image tag
/// standing in for the deployed git ref.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppReferences {
    pub app_repository: Option<String>,
    pub image_tag: Option<String>,
}

/// Derives the application repository and deployed image tag.
///
/// This never fails. Missing or malformed metadata leaves the
/// corresponding field empty.
#[must_use]
pub fn extract_references(images: &[ImageReference], info: &[InfoItem]) -> AppReferences {
    let app_repository = parse_app_repository(info);
    let image_repository = parse_image_repository(info);
    let image_tag = find_matching_image(images, image_repository.as_deref());

    debug!("image_repository={image_repository:?}");
    info!("Application repository: {app_repository:?}, image tag: {image_tag:?}");

    AppReferences {
        app_repository,
        image_tag,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn extracts_repository_and_tag() {
        let info = [
            InfoItem::new("Application Repository", "org/repo "),
            InfoItem::new("Image Repository", "registry/org/app"),
        ];
        let images = [ImageReference::from("registry/org/app:1.2.3@sha256:abcd")];

        assert_eq!(
            extract_references(&images, &info),
            AppReferences {
                app_repository: Some("org/repo".into()),
                image_tag: Some("1.2.3".into()),
            }
        );
    }

    #[rstest]
    #[case::no_image_repository(
        vec![InfoItem::new("Application Repository", "org/repo")],
        AppReferences { app_repository: Some("org/repo".into()), image_tag: None },
    )]
    #[case::no_app_repository(
        vec![InfoItem::new("Image Repository", "registry/org/app")],
        AppReferences { app_repository: None, image_tag: Some("2.0".into()) },
    )]
    #[case::nothing(vec![], AppReferences::default())]
    fn partial_metadata(#[case] info: Vec<InfoItem>, #[case] expected: AppReferences) {
        let images = [ImageReference::from("registry/org/app:2.0")];

        assert_eq!(extract_references(&images, &info), expected);
    }
}
