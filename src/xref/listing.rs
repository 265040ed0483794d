//! Lightweight listing: every loaded package, as loaded.

use std::convert::Infallible;

use super::traits::{StageReport, XrefStage};
use crate::model::{PackageRecord, RepoSnapshot};

#[derive(Debug, Default, Clone)]
pub struct PackageListing {
    pub packages: Vec<PackageRecord>,
}

impl StageReport for PackageListing {}

#[derive(Debug, Default, Clone, Copy)]
pub struct ListStage;

impl XrefStage for ListStage {
    type Input = RepoSnapshot;
    type Output = PackageListing;
    type Error = Infallible;

    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(PackageListing {
            packages: input.packages,
        })
    }

    fn stage_name(&self) -> &'static str {
        "package_listing"
    }
}
