//! The built-in `recommended` template

use super::licenses;
use super::{FileKind, TemplateConfig, TemplateFile};

const GITIGNORE: &str = "node_modules/
dist/
*.log
";

const INDEX_TS: &str = "/** Hello! */
export const Hello = (name: string): string => {
  return 'Hello ' + name;
};
";

const INDEX_TEST_TS: &str = "import { Hello } from '../src/index';

describe('The Hello Function', () => {
  it('produces the expected output', () => {
    expect(Hello('world')).toBe('Hello world');
  });
});
";

const README_MD: &str = "# {{lib_name}}

Short description of the library.

## Usage

```
import { Hello } from '{{lib_name}}';

console.log(Hello('world'));
```
";

const TSCONFIG_JSON: &str = r#"{
  "compilerOptions": {
    "target": "es2019",
    "module": "esnext",
    "moduleResolution": "node",
    "strict": true,
    "esModuleInterop": true,
    "declaration": true,
    "sourceMap": true,
    "skipLibCheck": true
  },
  "include": ["src"]
}
"#;

/// Files of the recommended template, before rendering
pub(super) fn files(cfg: &TemplateConfig) -> Vec<TemplateFile> {
    let mut files = Vec::new();

    if let Some(text) = licenses::find(&cfg.license).and_then(|l| l.render_text(cfg)) {
        files.push(TemplateFile::new("LICENSE", FileKind::Raw, text));
    }

    files.push(TemplateFile::new("src/index.ts", FileKind::Source, INDEX_TS));
    files.push(TemplateFile::new("README.md", FileKind::Text, README_MD));
    files.push(TemplateFile::new(
        "tests/index.test.ts",
        FileKind::Source,
        INDEX_TEST_TS,
    ));
    files.push(TemplateFile::new("tsconfig.json", FileKind::Raw, TSCONFIG_JSON));
    files.push(TemplateFile::new(".gitignore", FileKind::Text, GITIGNORE));

    files
}
