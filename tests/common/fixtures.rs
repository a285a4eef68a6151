//! The `tags` sample classpath: a `Tag` interface with two implementors, a
//! small `File`/`SourceFile` hierarchy and the platform classes they extend.
#![allow(dead_code)]

use super::class_writer::*;
use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const TAG: &str = "tags/Tag";
pub const TAG_NAME: &str = "tags/TagName";
pub const LINE: &str = "tags/Line";
pub const FILE: &str = "tags/File";
pub const SOURCE_FILE: &str = "tags/SourceFile";
pub const TAG_EXCEPTION: &str = "tags/TagException";
pub const LANGUAGE: &str = "tags/impl/Language";
pub const TODO: &str = "tags/impl/Todo";
pub const FIX_ME: &str = "tags/impl/FixMe";

const OBJECT: &str = "java/lang/Object";
const STRING: &str = "Ljava/lang/String;";

/// Project classes keyed by internal name.
pub fn tags_classes() -> Vec<(String, Vec<u8>)> {
    let classes = vec![
        (
            TAG,
            ClassWriter::interface(TAG)
                .abstract_method("getName", "()Ltags/TagName;", &[])
                .abstract_method("getLine", "()Ltags/Line;", &[])
                .abstract_method("validate", "()V", &[TAG_EXCEPTION])
                .build(),
        ),
        (TAG_NAME, ClassWriter::class(TAG_NAME).field("value", STRING).build()),
        (
            LINE,
            ClassWriter::class(LINE)
                .field("number", "I")
                .field("file", "Ltags/File;")
                .getter("getNumber", "()I", LINE, "number", IRETURN)
                .build(),
        ),
        (
            FILE,
            ClassWriter::class(FILE)
                .extends("java/util/Observable")
                .field("path", STRING)
                .method("<init>", "(Ljava/lang/String;)V", |c| {
                    c.op(ALOAD_0)
                        .invokespecial("java/util/Observable", "<init>", "()V")
                        .op(ALOAD_0)
                        .op(ALOAD_1)
                        .putfield(FILE, "path", STRING)
                        .op(RETURN);
                })
                .getter("getPath", "()Ljava/lang/String;", FILE, "path", ARETURN)
                .build(),
        ),
        (
            SOURCE_FILE,
            ClassWriter::class(SOURCE_FILE)
                .extends(FILE)
                .field("count", "I")
                .method("<init>", "(Ljava/lang/String;)V", |c| {
                    c.op(ALOAD_0)
                        .op(ALOAD_1)
                        .invokespecial(FILE, "<init>", "(Ljava/lang/String;)V")
                        .op(RETURN);
                })
                .getter("getLineCount", "()I", SOURCE_FILE, "count", IRETURN)
                .method("getPath", "()Ljava/lang/String;", |c| {
                    c.op(ALOAD_0)
                        .invokespecial(FILE, "getPath", "()Ljava/lang/String;")
                        .op(ARETURN);
                })
                .build(),
        ),
        (
            TAG_EXCEPTION,
            ClassWriter::class(TAG_EXCEPTION)
                .extends("java/lang/Exception")
                .method("<init>", "()V", |c| {
                    c.op(ALOAD_0)
                        .invokespecial("java/lang/Exception", "<init>", "()V")
                        .op(RETURN);
                })
                .build(),
        ),
        (
            LANGUAGE,
            ClassWriter::class(LANGUAGE)
                .field("name", STRING)
                .getter("getName", "()Ljava/lang/String;", LANGUAGE, "name", ARETURN)
                .build(),
        ),
        (TODO, todo()),
        (
            FIX_ME,
            ClassWriter::class(FIX_ME)
                .implements(TAG)
                .method("<init>", "()V", |c| {
                    c.op(ALOAD_0).invokespecial(OBJECT, "<init>", "()V").op(RETURN);
                })
                .method("getName", "()Ltags/TagName;", |c| {
                    c.op(ACONST_NULL).op(ARETURN);
                })
                .method("getLine", "()Ltags/Line;", |c| {
                    c.op(ACONST_NULL).op(ARETURN);
                })
                .method("validate", "()V", |c| {
                    c.op(RETURN);
                })
                .build(),
        ),
    ];
    classes
        .into_iter()
        .map(|(name, bytes)| (name.to_string(), bytes))
        .collect()
}

fn todo() -> Vec<u8> {
    ClassWriter::class(TODO)
        .implements(TAG)
        .field("name", "Ltags/TagName;")
        .field("line", "Ltags/Line;")
        .field("language", "Ltags/impl/Language;")
        .method("<init>", "(Ltags/TagName;)V", |c| {
            c.op(ALOAD_0)
                .invokespecial(OBJECT, "<init>", "()V")
                .op(ALOAD_0)
                .op(ALOAD_1)
                .putfield(TODO, "name", "Ltags/TagName;")
                .op(RETURN);
        })
        .getter("getName", "()Ltags/TagName;", TODO, "name", ARETURN)
        .getter("getLine", "()Ltags/Line;", TODO, "line", ARETURN)
        .method_full(
            ACC_PUBLIC,
            "validate",
            "()V",
            &[TAG_EXCEPTION],
            Some(|c: &mut Code<'_>| {
                c.op(ALOAD_0)
                    .getfield(TODO, "name", "Ltags/TagName;")
                    .branch(IFNONNULL, 11)
                    .new_object(TAG_EXCEPTION)
                    .op(DUP)
                    .invokespecial(TAG_EXCEPTION, "<init>", "()V")
                    .op(ATHROW)
                    .op(RETURN);
            }),
        )
        .method("getLineNumber", "()I", |c| {
            c.op(ALOAD_0)
                .invokevirtual(TODO, "getLine", "()Ltags/Line;")
                .getfield(LINE, "number", "I")
                .op(IRETURN);
        })
        .method("describe", "()Ljava/lang/String;", |c| {
            c.op(ALOAD_0)
                .getfield(TODO, "language", "Ltags/impl/Language;")
                .invokevirtual(LANGUAGE, "getName", "()Ljava/lang/String;")
                .op(ARETURN);
        })
        .build()
}

/// Platform classes the project extends.
pub fn platform_classes() -> Vec<(String, Vec<u8>)> {
    let object = ClassWriter::with_access(OBJECT, ACC_PUBLIC, None)
        .method("<init>", "()V", |c| {
            c.op(RETURN);
        })
        .method("toString", "()Ljava/lang/String;", |c| {
            c.op(ACONST_NULL).op(ARETURN);
        })
        .build();
    let throwable = ClassWriter::class("java/lang/Throwable")
        .method("<init>", "()V", |c| {
            c.op(ALOAD_0).invokespecial(OBJECT, "<init>", "()V").op(RETURN);
        })
        .build();
    let exception = ClassWriter::class("java/lang/Exception")
        .extends("java/lang/Throwable")
        .method("<init>", "()V", |c| {
            c.op(ALOAD_0)
                .invokespecial("java/lang/Throwable", "<init>", "()V")
                .op(RETURN);
        })
        .build();
    let observable = ClassWriter::class("java/util/Observable")
        .method("<init>", "()V", |c| {
            c.op(ALOAD_0).invokespecial(OBJECT, "<init>", "()V").op(RETURN);
        })
        .build();
    vec![
        (OBJECT.to_string(), object),
        ("java/lang/Throwable".to_string(), throwable),
        ("java/lang/Exception".to_string(), exception),
        ("java/util/Observable".to_string(), observable),
    ]
}

/// Write classes as `<dir>/<name>.class`.
pub fn write_class_dir(dir: &Path, classes: &[(String, Vec<u8>)]) -> Result<()> {
    for (name, bytes) in classes {
        let path = dir.join(format!("{name}.class"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
    }
    Ok(())
}

/// Write classes into a jar with a manifest entry.
pub fn write_jar(path: &Path, classes: &[(String, Vec<u8>)]) -> Result<()> {
    let mut zip = zip::ZipWriter::new(fs::File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("META-INF/MANIFEST.MF", options)?;
    zip.write_all(b"Manifest-Version: 1.0\n")?;
    for (name, bytes) in classes {
        zip.start_file(format!("{name}.class"), options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}

/// The sample laid out on disk: project classes in a directory, platform
/// classes in a jar.
pub struct TagsSample {
    pub dir: TempDir,
    pub classes: PathBuf,
    pub platform: PathBuf,
}

impl TagsSample {
    pub fn write() -> Result<Self> {
        let dir = TempDir::new()?;
        let classes = dir.path().join("classes");
        fs::create_dir_all(&classes)?;
        write_class_dir(&classes, &tags_classes())?;
        let platform = dir.path().join("platform.jar");
        write_jar(&platform, &platform_classes())?;
        Ok(Self {
            dir,
            classes,
            platform,
        })
    }
}
