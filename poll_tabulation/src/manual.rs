/*!

This is the long-form manual for `poll_tabulation` and `polltab`.

## Question types

Every analysed column is declared as one of two types. In configuration files,
the labels `MC` and `Checkbox` (from the survey tools the polls come from) are
accepted as well as `categorical` and `multiSelect`. Any other label is
rejected with a configuration error.

### Categorical (`MC`)

One answer per respondent. Text answers are kept as typed, so `007` and
`4.0` stay distinct from `7` and `4`; `polltab` reads every CSV cell as
text. Numeric cells (from spreadsheets, or built in code) are rendered with
their shortest decimal form (`2023`, `2022.5`). When display values are given for the question,
every other answer becomes `Other`.

### Multi-select (`Checkbox`)

"Select all that apply". The cell holds the selected labels joined by a
delimiter (`;` by default; Google Forms exports use `", "`):

```text
Class,What sports do you play?
2024,Tennis;Golf
2025,Golf
```

A text cell with no labels (`""`, or only delimiters) means the respondent
selected nothing. A missing cell is an error; note that `polltab` reads an
empty CSV or spreadsheet cell as missing. The question is expanded into one
0/1 indicator column per category:

| What sports do you play?: Golf | What sports do you play?: Tennis |
|--------------------------------|----------------------------------|
| 1                              | 1                                |
| 1                              | 0                                |

Indicator columns are always named `"<question>: <category>"`, sorted by
category. Cross-tabs and distributions label them by category alone.

With display values, only the listed categories get an indicator, and an
extra `<question>: Other` indicator marks the respondents who selected at
least one label outside the list. The `Other` indicator is emitted whenever
display values are configured, even if no respondent needs it.

## Weighting

Weights come from one stratifying variable. Each distinct value is a bucket
and the target distribution is uniform over the observed buckets: a
respondent in a bucket holding a share `f` of the sample gets the weight
`(1/k) / f` for `k` buckets.

For class years, truncation floors every value to an integer bucket after
remapping the combined cohort `2022.5` to `2023`. The remapping table can be
replaced in the configuration (`bucketRemap`).

## Cross-tabs

`crosstab(A, by B)` conditions on the categories of `B`:

| A \ B          | categorical B                 | multi-select B                          |
|----------------|-------------------------------|-----------------------------------------|
| categorical A  | weighted share of each A answer among respondents with that B answer | same, among respondents selecting that B category |
| multi-select A | weighted share selecting each A category among respondents with that B answer | same, among respondents selecting that B category |

Values are rounded to 2 decimals, and an empty group reports zeros.

## Margin of error

`moe = sqrt(deff) * z * sqrt(0.25 / N)` with the design effect
`deff = N * Σw² / (Σw)²` and `z = 1.96` unless configured otherwise.

## Configuration of `polltab`

```json
{
  "outputSettings": {
    "pollName": "Spring poll",
    "outputDirectory": "output",
    "recodedFileName": "poll_recoded.csv",
    "sanitize": ["What is your GPA?"]
  },
  "dataSource": { "provider": "csv", "filePath": "responses.csv" },
  "questions": [
    { "name": "What graduation class are you?", "type": "MC" },
    { "name": "What race(s) do you identify with?", "type": "Checkbox",
      "displayValues": ["White", "Asian", "Black"] }
  ],
  "weighting": { "variable": "What graduation class are you?", "truncate": true },
  "crosstabs": [
    { "crosstab": "What race(s) do you identify with?", "by": "What graduation class are you?" }
  ]
}
```

- `dataSource.provider`: `csv` or `xlsx`. Paths are relative to the
  configuration file. `excelWorksheetName` selects a worksheet (default: the
  first one) and `multiSelectDelimiter` changes the delimiter.
- `weighting.bucketRemap`: list of `{"from": 2022.5, "to": 2023}` entries
  replacing the default class year remap. `criticalValue` defaults to 1.96.
- `outputSettings.sanitize`: recoded columns to leave out of the CSV export.

 */
