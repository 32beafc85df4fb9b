//! Shared XML fixtures for tests.

use std::path::Path;

use civxml_common::SearchPaths;

use crate::FileDescription;

pub(crate) const UNIT_SCHEMA: &str = r#"<Schema xmlns="urn:schemas-microsoft-com:xml-data" xmlns:dt="urn:schemas-microsoft-com:datatypes">
	<ElementType name="Type" content="textOnly"/>
	<ElementType name="Description" content="textOnly"/>
	<ElementType name="Civilopedia" content="textOnly"/>
	<ElementType name="bGraphicalOnly" content="textOnly" dt:type="boolean"/>
	<ElementType name="iCost" content="textOnly" dt:type="int"/>
	<ElementType name="FlavorType" content="textOnly"/>
	<ElementType name="iFlavor" content="textOnly" dt:type="int"/>
	<ElementType name="Button" content="textOnly"/>
	<ElementType name="Flavor" content="eltOnly">
		<element type="FlavorType"/>
		<element type="iFlavor"/>
	</ElementType>
	<ElementType name="Flavors" content="eltOnly">
		<element type="Flavor" maxOccurs="*"/>
	</ElementType>
	<ElementType name="UnitInfo" content="eltOnly">
		<element type="Type"/>
		<element type="Description" minOccurs="0"/>
		<element type="Civilopedia" minOccurs="0"/>
		<element type="bGraphicalOnly" minOccurs="0"/>
		<element type="iCost"/>
		<element type="Flavors" minOccurs="0"/>
		<element type="Button" minOccurs="0"/>
	</ElementType>
	<ElementType name="UnitInfos" content="eltOnly">
		<element type="UnitInfo" maxOccurs="*"/>
	</ElementType>
	<ElementType name="Civ4UnitInfos" content="eltOnly">
		<element type="UnitInfos"/>
	</ElementType>
</Schema>"#;

pub(crate) const UNIT_INFOS: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<Civ4UnitInfos xmlns="x-schema:CIV4UnitSchema.xml">
	<UnitInfos>
		<UnitInfo>
			<Type>UNIT_WARRIOR</Type>
			<Description>TXT_KEY_UNIT_WARRIOR</Description>
			<iCost>15</iCost>
			<Flavors>
				<Flavor>
					<FlavorType>FLAVOR_MILITARY</FlavorType>
					<iFlavor>2</iFlavor>
				</Flavor>
			</Flavors>
			<Button>Art/Units/Warrior.dds</Button>
		</UnitInfo>
		<UnitInfo>
			<Type>UNIT_ARCHER</Type>
			<bGraphicalOnly>1</bGraphicalOnly>
			<iCost>25</iCost>
		</UnitInfo>
		<UnitInfo>
			<Type>UNIT_ZEBRA</Type>
			<iCost>5</iCost>
		</UnitInfo>
	</UnitInfos>
</Civ4UnitInfos>
"#;

pub(crate) const UNIT_CLASS_SCHEMA: &str = r#"<Schema xmlns="urn:schemas-microsoft-com:xml-data" xmlns:dt="urn:schemas-microsoft-com:datatypes">
	<ElementType name="Type" content="textOnly"/>
	<ElementType name="DefaultUnit" content="textOnly"/>
	<ElementType name="UnitClassInfo" content="eltOnly">
		<element type="Type"/>
		<element type="DefaultUnit"/>
	</ElementType>
	<ElementType name="UnitClassInfos" content="eltOnly">
		<element type="UnitClassInfo" maxOccurs="*"/>
	</ElementType>
	<ElementType name="Civ4UnitClassInfos" content="eltOnly">
		<element type="UnitClassInfos"/>
	</ElementType>
</Schema>"#;

pub(crate) const UNIT_CLASS_INFOS: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<Civ4UnitClassInfos xmlns="x-schema:CIV4UnitClassSchema.xml">
	<UnitClassInfos>
		<UnitClassInfo>
			<Type>UNITCLASS_WARRIOR</Type>
			<DefaultUnit>UNIT_WARRIOR</DefaultUnit>
		</UnitClassInfo>
		<UnitClassInfo>
			<Type>UNITCLASS_ARCHER</Type>
			<DefaultUnit>UNIT_ARCHER</DefaultUnit>
		</UnitClassInfo>
	</UnitClassInfos>
</Civ4UnitClassInfos>
"#;

pub(crate) const EDITOR_FILES: &str = r#"<?xml version="1.0"?>
<Files>
	<File>
		<Tag>UnitInfo</Tag>
		<Dir>Units</Dir>
		<Name>CIV4UnitInfos</Name>
		<Root>Civ4UnitInfos</Root>
	</File>
	<File>
		<Tag>UnitClassInfo</Tag>
		<Dir>Units</Dir>
		<Name>CIV4UnitClassInfos</Name>
		<Root>Civ4UnitClassInfos</Root>
	</File>
	<File>
		<Tag>InfoClass</Tag>
		<Dir>Misc</Dir>
		<SubFiles>
			<Tag>UnitInfo</Tag>
			<Tag>UnitClassInfo</Tag>
		</SubFiles>
	</File>
</Files>
<Languages>
	<DefaultString>-</DefaultString>
	<List>
		<French/>
		<German/>
	</List>
</Languages>
"#;

pub(crate) const EDITOR_INFOS: &str = r#"<?xml version="1.0"?>
<Tags>
	<DefaultUnit>
		<Type>UnitInfo</Type>
		<Help>Unit built by default</Help>
		<bRemoteCreate>1</bRemoteCreate>
	</DefaultUnit>
	<FlavorType>
		<bAllowTypeNone>1</bAllowTypeNone>
	</FlavorType>
	<Button>
		<Class>Button</Class>
	</Button>
</Tags>
<FileSpecific>
	<UnitClassInfo>
		<DefaultUnit>
			<Help>Default unit of the class</Help>
		</DefaultUnit>
	</UnitClassInfo>
</FileSpecific>
"#;

/// Write `(logical name, contents)` pairs below `root`.
pub(crate) fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

/// The data files and their schemas.
pub(crate) const DATA_FILES: &[(&str, &str)] = &[
    ("Units/CIV4UnitInfos.xml", UNIT_INFOS),
    ("Units/CIV4UnitSchema.xml", UNIT_SCHEMA),
    ("Units/CIV4UnitClassInfos.xml", UNIT_CLASS_INFOS),
    ("Units/CIV4UnitClassSchema.xml", UNIT_CLASS_SCHEMA),
];

/// A mod root holding the data files and the editor settings.
pub(crate) fn editor_mod() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), DATA_FILES);
    write_files(
        dir.path(),
        &[
            ("Editor/EditorFiles.xml", EDITOR_FILES),
            ("Editor/EditorInfos.xml", EDITOR_INFOS),
        ],
    );
    dir
}

/// An empty mod root over a vanilla root holding the data files.
pub(crate) fn vanilla_only() -> (tempfile::TempDir, tempfile::TempDir, SearchPaths) {
    let modd = tempfile::tempdir().unwrap();
    let vanilla = tempfile::tempdir().unwrap();
    write_files(vanilla.path(), DATA_FILES);
    write_files(vanilla.path(), &[("Editor/EditorFiles.xml", EDITOR_FILES)]);
    let paths = SearchPaths::with_mod(modd.path()).with_root(vanilla.path());
    (modd, vanilla, paths)
}

pub(crate) fn unit_description() -> FileDescription {
    FileDescription::single("UnitInfo", "Units", "CIV4UnitInfos", "Civ4UnitInfos")
}

pub(crate) fn unit_class_description() -> FileDescription {
    FileDescription::single(
        "UnitClassInfo",
        "Units",
        "CIV4UnitClassInfos",
        "Civ4UnitClassInfos",
    )
}
